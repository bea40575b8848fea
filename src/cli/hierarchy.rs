//! `providers` and `models` subcommands.

use std::error::Error;

use clap::Subcommand;

use crate::auth::ui::{confirm, prompt_line};
use crate::cli::format::{format_models, format_providers};
use crate::core::app::App;
use crate::core::hierarchy::{PendingModelDeletion, PendingProviderDeletion};

#[derive(Subcommand, Debug)]
pub enum ProviderCommand {
    /// List configured providers
    List,
    /// Add a provider; prompts for the API key when --credential is omitted
    Add {
        name: String,
        #[arg(long)]
        credential: Option<String>,
    },
    /// Rename a provider or rotate its API key
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// New API key; leave out to keep the stored one
        #[arg(long)]
        credential: Option<String>,
    },
    /// Delete a provider together with all of its models
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommand {
    /// List the models of one provider
    List {
        #[arg(long)]
        provider: String,
    },
    /// Add a model under a provider
    Add {
        #[arg(long)]
        provider: String,
        name: String,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Rename a model or change its base URL
    Edit {
        #[arg(long)]
        provider: String,
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Delete a model
    Remove {
        #[arg(long)]
        provider: String,
        id: String,
    },
}

fn describe_provider_deletion(pending: &PendingProviderDeletion) -> String {
    match pending.model_count() {
        0 => format!("Delete provider {} ({})?", pending.name(), pending.id()),
        1 => format!(
            "Delete provider {} ({}) and its 1 model?",
            pending.name(),
            pending.id()
        ),
        n => format!(
            "Delete provider {} ({}) and its {n} models?",
            pending.name(),
            pending.id()
        ),
    }
}

fn describe_model_deletion(pending: &PendingModelDeletion) -> String {
    format!(
        "Delete model {} ({}) from provider {}?",
        pending.name(),
        pending.id(),
        pending.provider_id()
    )
}

pub async fn run_providers(
    app: &App,
    command: ProviderCommand,
    assume_yes: bool,
) -> Result<(), Box<dyn Error>> {
    let hierarchy = app.hierarchy();
    match command {
        ProviderCommand::List => {
            print!("{}", format_providers(&hierarchy.list_providers().await?));
        }
        ProviderCommand::Add { name, credential } => {
            let credential = match credential {
                Some(credential) => credential,
                None => prompt_line(&format!("API key for {}: ", name.trim()))?.unwrap_or_default(),
            };
            let provider = hierarchy.create_provider(&name, &credential).await?;
            println!("✅ Added provider {} ({})", provider.name, provider.id);
        }
        ProviderCommand::Edit {
            id,
            name,
            credential,
        } => {
            let name = match name {
                Some(name) => name,
                None => current_provider_name(app, &id).await?,
            };
            let provider = hierarchy
                .update_provider(&id, &name, credential.as_deref())
                .await?;
            println!("✅ Updated provider {} ({})", provider.name, provider.id);
        }
        ProviderCommand::Remove { id } => {
            let pending = hierarchy.request_provider_deletion(&id).await?;
            if !assume_yes && !confirm(&describe_provider_deletion(&pending))? {
                println!("Cancelled.");
                return Ok(());
            }
            let name = pending.name().to_string();
            hierarchy.delete_provider(pending).await?;
            println!("✅ Deleted provider {name}");
        }
    }
    Ok(())
}

async fn current_provider_name(app: &App, id: &str) -> Result<String, Box<dyn Error>> {
    let providers = app.hierarchy().list_providers().await?;
    providers
        .into_iter()
        .find(|provider| provider.id == id)
        .map(|provider| provider.name)
        .ok_or_else(|| format!("provider {id} does not exist").into())
}

pub async fn run_models(
    app: &App,
    command: ModelCommand,
    assume_yes: bool,
) -> Result<(), Box<dyn Error>> {
    let hierarchy = app.hierarchy();
    match command {
        ModelCommand::List { provider } => {
            let models = hierarchy.list_models(&provider).await?;
            print!("{}", format_models(&provider, &models));
        }
        ModelCommand::Add {
            provider,
            name,
            base_url,
        } => {
            let model = hierarchy
                .create_model(&provider, &name, base_url.as_deref())
                .await?;
            println!("✅ Added model {} ({})", model.name, model.id);
        }
        ModelCommand::Edit {
            provider,
            id,
            name,
            base_url,
        } => {
            let model = hierarchy
                .update_model(&provider, &id, name.as_deref(), base_url.as_deref())
                .await?;
            println!("✅ Updated model {} ({})", model.name, model.id);
        }
        ModelCommand::Remove { provider, id } => {
            let pending = hierarchy.request_model_deletion(&provider, &id).await?;
            if !assume_yes && !confirm(&describe_model_deletion(&pending))? {
                println!("Cancelled.");
                return Ok(());
            }
            let name = pending.name().to_string();
            hierarchy.delete_model(pending).await?;
            println!("✅ Deleted model {name}");
        }
    }
    Ok(())
}
