//! Provider → Model configuration rules.
//!
//! Providers own models: a model cannot be created without a parent, the
//! model view only ever shows one parent's children, and deleting a
//! provider takes its models with it. Deletions go through a two-step
//! request/confirm flow so they cannot be issued by accident.

use crate::api::{
    ModelConfig, ModelUpdate, NewModel, NewProvider, ProviderConfig, ProviderUpdate, RemoteFailure,
};
use crate::core::constants::{MODEL_NAME_MAX_CHARS, PROVIDER_NAME_MAX_CHARS};
use crate::core::error::{Failure, Field, ValidationFailure};
use crate::core::flight::SingleFlight;
use crate::core::mutation::{
    CreateModel, CreateProvider, DeleteModel, DeleteProvider, MutationCoordinator, UpdateModel,
    UpdateProvider,
};
use crate::core::queries::QueryClient;

/// A provider deletion the user has been asked to confirm.
///
/// Only [`ConfigHierarchy::request_provider_deletion`] creates one, and
/// [`ConfigHierarchy::delete_provider`] consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingProviderDeletion {
    id: String,
    name: String,
    model_count: usize,
}

impl PendingProviderDeletion {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Models that will be removed along with the provider.
    pub fn model_count(&self) -> usize {
        self.model_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingModelDeletion {
    id: String,
    provider_id: String,
    name: String,
}

impl PendingModelDeletion {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

pub struct ConfigHierarchy {
    queries: QueryClient,
    coordinator: MutationCoordinator,
    destructive: SingleFlight,
}

impl ConfigHierarchy {
    pub fn new(queries: QueryClient, coordinator: MutationCoordinator) -> Self {
        Self {
            queries,
            coordinator,
            destructive: SingleFlight::new("configuration change"),
        }
    }

    pub async fn list_providers(&self) -> Result<Vec<ProviderConfig>, Failure> {
        self.queries.providers().await
    }

    /// Models whose parent is `provider_id`, and no others.
    pub async fn list_models(&self, provider_id: &str) -> Result<Vec<ModelConfig>, Failure> {
        self.queries.models_for(provider_id).await
    }

    pub async fn create_provider(
        &self,
        name: &str,
        credential: &str,
    ) -> Result<ProviderConfig, Failure> {
        let name = validate_name(name, Field::Name, PROVIDER_NAME_MAX_CHARS)?;
        let credential = non_blank(Some(credential))
            .ok_or_else(|| ValidationFailure::required(Field::Credential))?;

        let operation = CreateProvider {
            provider: NewProvider { name, credential },
        };
        self.coordinator.execute(&operation).await
    }

    /// Rename a provider. A missing or blank `credential` keeps the stored one.
    pub async fn update_provider(
        &self,
        id: &str,
        name: &str,
        credential: Option<&str>,
    ) -> Result<ProviderConfig, Failure> {
        let name = validate_name(name, Field::Name, PROVIDER_NAME_MAX_CHARS)?;
        let _flight = self.destructive.try_begin()?;

        let operation = UpdateProvider {
            id: id.to_string(),
            update: ProviderUpdate {
                name,
                credential: non_blank(credential),
            },
        };
        self.coordinator.execute(&operation).await
    }

    /// First step of deleting a provider: look it up and count what goes
    /// with it.
    pub async fn request_provider_deletion(
        &self,
        id: &str,
    ) -> Result<PendingProviderDeletion, Failure> {
        let provider = self
            .list_providers()
            .await?
            .into_iter()
            .find(|provider| provider.id == id)
            .ok_or_else(|| RemoteFailure::not_found(format!("provider {id} does not exist")))?;
        let model_count = self.list_models(id).await?.len();

        Ok(PendingProviderDeletion {
            id: provider.id,
            name: provider.name,
            model_count,
        })
    }

    /// Delete a confirmed provider and, server-side, all of its models.
    pub async fn delete_provider(&self, confirmed: PendingProviderDeletion) -> Result<(), Failure> {
        let _flight = self.destructive.try_begin()?;
        let operation = DeleteProvider { id: confirmed.id };
        self.coordinator.execute(&operation).await
    }

    pub async fn create_model(
        &self,
        provider_id: &str,
        name: &str,
        base_url: Option<&str>,
    ) -> Result<ModelConfig, Failure> {
        let provider_id = non_blank(Some(provider_id))
            .ok_or_else(|| ValidationFailure::required(Field::ProviderId))?;
        let name = validate_name(name, Field::Name, MODEL_NAME_MAX_CHARS)?;

        let operation = CreateModel {
            model: NewModel {
                provider_id,
                name,
                base_url: non_blank(base_url),
            },
        };
        self.coordinator.execute(&operation).await
    }

    /// Change a model's name and/or base URL. `None` leaves a field as is;
    /// a blank base URL counts as `None`.
    pub async fn update_model(
        &self,
        provider_id: &str,
        model_id: &str,
        name: Option<&str>,
        base_url: Option<&str>,
    ) -> Result<ModelConfig, Failure> {
        let name = name
            .map(|name| validate_name(name, Field::Name, MODEL_NAME_MAX_CHARS))
            .transpose()?;
        let update = ModelUpdate {
            name,
            base_url: non_blank(base_url),
        };
        if update.is_empty() {
            return Err(ValidationFailure::nothing_to_update(Field::Name).into());
        }
        let _flight = self.destructive.try_begin()?;

        let operation = UpdateModel {
            id: model_id.to_string(),
            provider_id: provider_id.to_string(),
            update,
        };
        self.coordinator.execute(&operation).await
    }

    pub async fn request_model_deletion(
        &self,
        provider_id: &str,
        model_id: &str,
    ) -> Result<PendingModelDeletion, Failure> {
        let model = self
            .list_models(provider_id)
            .await?
            .into_iter()
            .find(|model| model.id == model_id)
            .ok_or_else(|| {
                RemoteFailure::not_found(format!(
                    "model {model_id} does not exist under provider {provider_id}"
                ))
            })?;

        Ok(PendingModelDeletion {
            id: model.id,
            provider_id: model.provider_id,
            name: model.name,
        })
    }

    pub async fn delete_model(&self, confirmed: PendingModelDeletion) -> Result<(), Failure> {
        let _flight = self.destructive.try_begin()?;
        let operation = DeleteModel {
            id: confirmed.id,
            provider_id: confirmed.provider_id,
        };
        self.coordinator.execute(&operation).await
    }
}

fn validate_name(raw: &str, field: Field, max_chars: usize) -> Result<String, ValidationFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::required(field));
    }
    let length = trimmed.chars().count();
    if length > max_chars {
        return Err(ValidationFailure::too_long(field, max_chars, length));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
