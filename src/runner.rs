//! Module entry point.
//!
//! Validates the caller's parameters, connects to Micetro and runs one
//! reconciliation. Validation always happens before any network I/O.

use serde_json::{Value, json};
use tracing::info;

use crate::api::{MicetroApi, MicetroClient};
use crate::config::{
    GroupParams, ParamValidator, PropertyParams, ProviderConfig, UserParams, ZoneParams,
};
use crate::error::{MicetroError, Result};
use crate::reconciler::{ReconciliationResult, Reconciler};

/// Runs one module invocation against a Micetro server.
#[derive(Debug)]
pub struct ModuleRunner {
    /// Connection settings.
    provider: ProviderConfig,
    /// Read and diff only.
    check_mode: bool,
    /// Parameter validator.
    validator: ParamValidator,
}

impl ModuleRunner {
    /// Creates a runner for the given connection settings.
    #[must_use]
    pub const fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            check_mode: false,
            validator: ParamValidator::new(),
        }
    }

    /// Enables check mode.
    #[must_use]
    pub const fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Reconciles a group.
    ///
    /// # Errors
    ///
    /// Returns a validation error before connecting if the parameters are
    /// invalid, or any error from the reconciliation itself.
    pub async fn run_group(&self, params: &GroupParams) -> Result<ReconciliationResult> {
        self.validator.validate_group(params)?;
        let client = self.connect()?;
        self.reconciler(&client).reconcile_group(params).await
    }

    /// Reconciles a DNS zone.
    ///
    /// # Errors
    ///
    /// Returns a validation error before connecting if the parameters are
    /// invalid, or any error from the reconciliation itself.
    pub async fn run_zone(&self, params: &ZoneParams) -> Result<ReconciliationResult> {
        self.validator.validate_zone(params)?;
        let client = self.connect()?;
        self.reconciler(&client).reconcile_zone(params).await
    }

    /// Reconciles a user account.
    ///
    /// # Errors
    ///
    /// Returns a validation error before connecting if the parameters are
    /// invalid, or any error from the reconciliation itself.
    pub async fn run_user(&self, params: &UserParams) -> Result<ReconciliationResult> {
        self.validator.validate_user(params)?;
        let client = self.connect()?;
        self.reconciler(&client).reconcile_user(params).await
    }

    /// Reconciles a custom property definition.
    ///
    /// # Errors
    ///
    /// Returns a validation error before connecting if the parameters are
    /// invalid, or any error from the reconciliation itself.
    pub async fn run_property(&self, params: &PropertyParams) -> Result<ReconciliationResult> {
        self.validator.validate_property(params)?;
        let client = self.connect()?;
        self.reconciler(&client).reconcile_property(params).await
    }

    /// Reconciles a group through an existing API implementation.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling `api` if the parameters
    /// are invalid, or any error from the reconciliation itself.
    pub async fn run_group_with<A: MicetroApi + ?Sized>(
        &self,
        api: &A,
        params: &GroupParams,
    ) -> Result<ReconciliationResult> {
        self.validator.validate_group(params)?;
        self.reconciler(api).reconcile_group(params).await
    }

    /// Reconciles a DNS zone through an existing API implementation.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling `api` if the parameters
    /// are invalid, or any error from the reconciliation itself.
    pub async fn run_zone_with<A: MicetroApi + ?Sized>(
        &self,
        api: &A,
        params: &ZoneParams,
    ) -> Result<ReconciliationResult> {
        self.validator.validate_zone(params)?;
        self.reconciler(api).reconcile_zone(params).await
    }

    /// Reconciles a user through an existing API implementation.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling `api` if the parameters
    /// are invalid, or any error from the reconciliation itself.
    pub async fn run_user_with<A: MicetroApi + ?Sized>(
        &self,
        api: &A,
        params: &UserParams,
    ) -> Result<ReconciliationResult> {
        self.validator.validate_user(params)?;
        self.reconciler(api).reconcile_user(params).await
    }

    /// Reconciles a property definition through an existing API implementation.
    ///
    /// # Errors
    ///
    /// Returns a validation error without calling `api` if the parameters
    /// are invalid, or any error from the reconciliation itself.
    pub async fn run_property_with<A: MicetroApi + ?Sized>(
        &self,
        api: &A,
        params: &PropertyParams,
    ) -> Result<ReconciliationResult> {
        self.validator.validate_property(params)?;
        self.reconciler(api).reconcile_property(params).await
    }

    /// Validates the connection settings and builds the HTTP client.
    fn connect(&self) -> Result<MicetroClient> {
        self.validator.validate_provider(&self.provider)?;
        info!("Connecting to {}", self.provider.api_base());
        MicetroClient::new(&self.provider)
    }

    fn reconciler<'a, A: MicetroApi + ?Sized>(&self, api: &'a A) -> Reconciler<'a, A> {
        Reconciler::new(api).with_check_mode(self.check_mode)
    }
}

/// Renders the document reported for a failed invocation.
#[must_use]
pub fn failure_document(err: &MicetroError) -> Value {
    json!({
        "failed": true,
        "msg": err.to_string(),
        "kind": err.kind(),
    })
}
