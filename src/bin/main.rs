use account_gateway::mutations::{MutationDescriptor, SchemaRegistrar};
use account_gateway::{
    AuthContext, AuthPrincipal, GatewayConfig, MutationKind, MutationRequest, ViewerSelection,
    memory_gateway, register_mutations,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "account-gateway")]
#[command(about = "Account mutation gateway demo (in-memory backend)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full mutation sequence against the in-memory backend
    Demo {
        #[arg(long, default_value = "alice")]
        username: String,
        #[arg(long, default_value = "hunter2")]
        password: String,
        #[arg(long, default_value = "alice@example.com")]
        email: String,
        /// Send a verification email for new accounts
        #[arg(long, default_value_t = false)]
        verify_emails: bool,
    },
    /// Print the declared mutation schema
    Schema,
}

struct PrintingRegistrar;

impl SchemaRegistrar for PrintingRegistrar {
    fn register_mutation(&mut self, descriptor: &'static MutationDescriptor) {
        println!("{} — {}", descriptor.name, descriptor.description);
        for spec in descriptor.inputs {
            println!(
                "  in  {}{}: {:?} — {}",
                spec.name,
                if spec.required { "!" } else { "" },
                spec.kind,
                spec.description
            );
        }
        for spec in descriptor.outputs {
            println!(
                "  out {}{}: {:?} — {}",
                spec.name,
                if spec.required { "!" } else { "" },
                spec.kind,
                spec.description
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("account_gateway=debug".parse()?),
        )
        .with_max_level(Level::DEBUG)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            username,
            password,
            email,
            verify_emails,
        } => {
            let config = Arc::new(GatewayConfig {
                verify_account_emails: verify_emails,
                ..GatewayConfig::local()
            });
            let (gateway, backend) = memory_gateway();
            let selection = ViewerSelection::all();

            // signUp
            let mut args = serde_json::Map::new();
            args.insert(
                "accountFields".to_string(),
                json!({ "username": username, "password": password, "email": email }),
            );
            args.insert("clientMutationId".to_string(), json!("demo-1"));
            let request = MutationRequest::from_args(MutationKind::SignUp, &args)?;

            let mut ctx = AuthContext::public(config.clone());
            let payload = gateway.execute(request, &mut ctx, &selection).await?;
            println!(
                "signUp -> {}",
                serde_json::to_string_pretty(&payload.to_value(&selection))?
            );

            let token = ctx
                .request_info()
                .session_token
                .clone()
                .expect("sign-up issues a session");

            // logOut with the issued session
            let mut session_ctx = AuthContext::new(
                config.clone(),
                AuthPrincipal::Session {
                    token: token.clone(),
                },
            );
            let request = MutationRequest::from_args(
                MutationKind::LogOut,
                &serde_json::Map::new(),
            )?;
            let payload = gateway.execute(request, &mut session_ctx, &selection).await?;
            println!(
                "logOut -> {}",
                serde_json::to_string_pretty(&payload.to_value(&selection))?
            );

            // logIn again
            let mut args = serde_json::Map::new();
            args.insert("username".to_string(), json!(username));
            args.insert("password".to_string(), json!(password));
            let request = MutationRequest::from_args(MutationKind::LogIn, &args)?;

            let mut ctx = AuthContext::public(config.clone());
            let payload = gateway.execute(request, &mut ctx, &selection).await?;
            println!(
                "logIn -> {}",
                serde_json::to_string_pretty(&payload.to_value(&selection))?
            );

            // resetPassword, then once for an address nobody owns
            for target in [email.as_str(), "nonexistent@example.com"] {
                let mut args = serde_json::Map::new();
                args.insert("email".to_string(), json!(target));
                let request = MutationRequest::from_args(MutationKind::ResetPassword, &args)?;
                let mut ctx = AuthContext::public(config.clone());
                let payload = gateway.execute(request, &mut ctx, &selection).await?;
                println!(
                    "resetPassword({}) -> {}",
                    target,
                    payload.to_value(&selection)
                );
            }

            println!("outbox:");
            for notice in backend.outbox().await {
                println!("  {:?} -> {}", notice.kind, notice.email);
            }
        }
        Commands::Schema => {
            register_mutations(&mut PrintingRegistrar, &GatewayConfig::local());
        }
    }

    Ok(())
}
