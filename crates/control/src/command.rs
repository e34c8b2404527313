//! Closed set of control-plane commands and text parsing.

/// Everything a sender can ask the control plane to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Raw target id as typed by the sender; validated by the handler.
    AddPrincipal { target: String },
    UploadFile { file_name: String, content: Vec<u8> },
    ListFiles,
    ShowStats,
    Help,
}

impl Command {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AddPrincipal { .. } => "add_principal",
            Self::UploadFile { .. } => "upload_file",
            Self::ListFiles => "list_files",
            Self::ShowStats => "show_stats",
            Self::Help => "help",
        }
    }

    /// Whether the sender must already be a registry member.
    pub fn requires_membership(&self) -> bool {
        !matches!(self, Self::Start | Self::Help)
    }
}

/// Map a text message to a command.
///
/// Accepts slash commands (optionally suffixed with `@botname`) and the
/// reply-keyboard labels. Uploads arrive as documents, never as text, so
/// [`Command::UploadFile`] is built by the transport directly. Returns
/// `None` for anything else.
pub fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    match text {
        "My Files" => return Some(Command::ListFiles),
        "Server Stats" => return Some(Command::ShowStats),
        "Help" | "Upload & Run" | "Manage Running" => return Some(Command::Help),
        _ => {}
    }

    let rest = text.strip_prefix('/')?;
    let (head, args) = rest
        .split_once(char::is_whitespace)
        .map(|(head, args)| (head, args.trim()))
        .unwrap_or((rest, ""));
    let name = head.split('@').next().unwrap_or(head);

    match name {
        "start" => Some(Command::Start),
        "add" => Some(Command::AddPrincipal {
            target: args.to_string(),
        }),
        "list" | "files" => Some(Command::ListFiles),
        "stats" => Some(Command::ShowStats),
        "help" => Some(Command::Help),
        _ => None,
    }
}
