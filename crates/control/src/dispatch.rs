//! Command dispatch: one handler interface, one core call per command.

use std::sync::Arc;

use async_trait::async_trait;
use scriptgate_core::config::GatewayConfig;
use scriptgate_core::error::CoreError;
use scriptgate_core::registry::AuthorizationRegistry;
use scriptgate_core::scripting::GatewayStats;
use scriptgate_core::store::{sanitize_file_name, TenantScriptStore};
use scriptgate_core::types::PrincipalId;

use crate::client::{script_url, GatewayClient};
use crate::command::Command;
use crate::error::ControlError;
use crate::present::render_test_run;

/// Plain-text reply sent back to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlReply {
    pub text: String,
}

impl ControlReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Execute `command` on behalf of `sender`, an id the transport has
    /// already authenticated.
    async fn handle(&self, sender: PrincipalId, command: Command)
        -> Result<ControlReply, ControlError>;

    /// Like [`handle`](Self::handle), with errors rendered as a reply.
    async fn respond(&self, sender: PrincipalId, command: Command) -> ControlReply {
        match self.handle(sender, command).await {
            Ok(reply) => reply,
            Err(err) => ControlReply::new(err.reply_text()),
        }
    }
}

/// Presentation settings taken from [`GatewayConfig`].
#[derive(Debug, Clone)]
pub struct ControlSettings {
    pub output_cap_bytes: usize,
    pub public_base_url: String,
}

impl From<&GatewayConfig> for ControlSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            output_cap_bytes: config.output_cap_bytes,
            public_base_url: config.public_base_url.clone(),
        }
    }
}

/// The control plane shared by every chat session.
pub struct ControlPlane {
    registry: Arc<dyn AuthorizationRegistry>,
    store: Arc<TenantScriptStore>,
    stats: Arc<GatewayStats>,
    client: Arc<dyn GatewayClient>,
    settings: ControlSettings,
}

impl ControlPlane {
    pub fn new(
        registry: Arc<dyn AuthorizationRegistry>,
        store: Arc<TenantScriptStore>,
        stats: Arc<GatewayStats>,
        client: Arc<dyn GatewayClient>,
        settings: ControlSettings,
    ) -> Self {
        Self {
            registry,
            store,
            stats,
            client,
            settings,
        }
    }

    async fn require_member(&self, sender: PrincipalId) -> Result<(), ControlError> {
        if self.registry.contains(sender).await {
            Ok(())
        } else {
            Err(CoreError::Authorization(format!("Principal {sender} is not registered")).into())
        }
    }

    async fn start(&self, sender: PrincipalId) -> ControlReply {
        if self.registry.contains(sender).await {
            ControlReply::new(format!(
                "Welcome! Send me a {ext} file and I will host it.\n\
                 Your scripts are served at {base}/run/{sender}/<file name>.",
                ext = self.store.extension(),
                base = self.settings.public_base_url,
            ))
        } else {
            ControlReply::new(format!(
                "You are not authorized to use this service.\n\
                 Ask the admin to add your id: {sender}"
            ))
        }
    }

    fn help(&self) -> ControlReply {
        ControlReply::new(format!(
            "Send a {ext} file as a document to upload it. It is test-run once and \
             then served at {base}/run/<your id>/<file name>.\n\n\
             /list - your scripts\n\
             /stats - gateway statistics\n\
             /add <id> - authorize a new user (admin only)\n\
             /help - this message",
            ext = self.store.extension(),
            base = self.settings.public_base_url,
        ))
    }

    async fn add_principal(
        &self,
        sender: PrincipalId,
        target: &str,
    ) -> Result<ControlReply, ControlError> {
        let new_id: i64 = target.trim().parse().map_err(|_| {
            CoreError::Validation(format!("'{target}' is not a valid principal id"))
        })?;
        self.registry.add(sender, new_id).await?;
        Ok(ControlReply::new(format!("Principal {new_id} can now use the gateway.")))
    }

    async fn upload(
        &self,
        sender: PrincipalId,
        file_name: &str,
        content: &[u8],
    ) -> Result<ControlReply, ControlError> {
        let base = sanitize_file_name(file_name)?;
        if !self.store.has_allowed_extension(&base) {
            return Err(ControlError::Rejected(format!(
                "Only {} files are accepted",
                self.store.extension()
            )));
        }

        let record = self.store.upload(sender, file_name, content).await?;
        let link = script_url(&self.settings.public_base_url, sender, &record.file_name)?;

        let report = match self.client.invoke(sender, &record.file_name).await {
            Ok(result) => render_test_run(result, self.settings.output_cap_bytes),
            Err(err) => {
                tracing::warn!(error = %err, owner = %sender, file = %record.file_name, "Test run failed");
                "Test run skipped: the gateway is not reachable right now.".to_string()
            }
        };

        Ok(ControlReply::new(format!(
            "Saved {name} ({size} bytes).\n\n{report}\n\nLive link: {link}",
            name = record.file_name,
            size = record.size_bytes,
        )))
    }

    async fn list_files(&self, sender: PrincipalId) -> Result<ControlReply, ControlError> {
        let records = self.store.list(sender).await?;
        if records.is_empty() {
            return Ok(ControlReply::new("You have not uploaded any scripts yet."));
        }

        let mut text = format!("Your scripts ({}):", records.len());
        for record in &records {
            let link = script_url(&self.settings.public_base_url, sender, &record.file_name)?;
            text.push_str(&format!("\n- {} ({} bytes) {link}", record.file_name, record.size_bytes));
        }
        Ok(ControlReply::new(text))
    }

    async fn show_stats(&self, sender: PrincipalId) -> Result<ControlReply, ControlError> {
        let snapshot = self.stats.snapshot();
        let scripts = self.store.count(sender).await?;
        Ok(ControlReply::new(format!(
            "Uptime: {uptime}s\n\
             Invocations: {total}\n\
             - success: {success}\n\
             - script errors: {script_error}\n\
             - timeouts: {timeout}\n\
             - not found: {not_found}\n\
             - server errors: {server_error}\n\
             Your scripts: {scripts}",
            uptime = snapshot.uptime_secs,
            total = snapshot.total,
            success = snapshot.success,
            script_error = snapshot.script_error,
            timeout = snapshot.timeout,
            not_found = snapshot.not_found,
            server_error = snapshot.server_error,
        )))
    }
}

#[async_trait]
impl CommandHandler for ControlPlane {
    async fn handle(
        &self,
        sender: PrincipalId,
        command: Command,
    ) -> Result<ControlReply, ControlError> {
        tracing::info!(%sender, command = command.name(), "Control command received");
        if command.requires_membership() {
            self.require_member(sender).await?;
        }

        match command {
            Command::Start => Ok(self.start(sender).await),
            Command::Help => Ok(self.help()),
            Command::AddPrincipal { target } => self.add_principal(sender, &target).await,
            Command::UploadFile { file_name, content } => {
                self.upload(sender, &file_name, &content).await
            }
            Command::ListFiles => self.list_files(sender).await,
            Command::ShowStats => self.show_stats(sender).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
