// setkit-common/src/model/action.rs
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::scalar_string;
use crate::context::Context;

/// One step of an install phase or utility script.
///
/// The catalog stores actions as flat maps: the `Type` key selects the kind and
/// the remaining keys are that kind's fields. `requiresAdmin` applies to every
/// kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallAction {
    pub kind: ActionKind,
    pub requires_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Downloads the owning application's installer and runs it with `args`.
    DownloadAndRun {
        args: Option<String>,
    },
    Download {
        url: Option<String>,
        file_name: Option<String>,
    },
    Extract {
        archive: Option<String>,
        destination: Option<String>,
        args: Option<String>,
    },
    RunCommand {
        command: Option<String>,
    },
    RunScript {
        path: Option<String>,
        args: Option<String>,
    },
    OpenFile {
        path: Option<String>,
    },
    CreateShortcut {
        target: Option<String>,
        shortcut_name: Option<String>,
    },
    /// Any `Type` this version does not know, kept by name. Skipped at dispatch time.
    Unknown {
        type_name: String,
    },
}

/// The catalog's flat record. Keys that do not belong to the selected kind are
/// ignored.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    #[serde(rename = "Type", alias = "type", default, deserialize_with = "scalar_string")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    archive: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    args: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    shortcut_name: Option<String>,
    #[serde(default)]
    requires_admin: bool,
}

impl From<RawAction> for InstallAction {
    fn from(raw: RawAction) -> Self {
        let type_name = raw.kind.unwrap_or_default();
        let kind = match type_name.as_str() {
            "DownloadAndRun" => ActionKind::DownloadAndRun { args: raw.args },
            "Download" => ActionKind::Download {
                url: raw.url,
                file_name: raw.file_name,
            },
            "Extract" => ActionKind::Extract {
                archive: raw.archive,
                destination: raw.destination,
                args: raw.args,
            },
            "RunCommand" => ActionKind::RunCommand {
                command: raw.command,
            },
            "RunScript" => ActionKind::RunScript {
                path: raw.path,
                args: raw.args,
            },
            "OpenFile" => ActionKind::OpenFile { path: raw.path },
            "CreateShortcut" => ActionKind::CreateShortcut {
                target: raw.target,
                shortcut_name: raw.shortcut_name,
            },
            _ => {
                debug!("Catalog action has unrecognised Type '{}'", type_name);
                ActionKind::Unknown { type_name }
            }
        };
        InstallAction {
            kind,
            requires_admin: raw.requires_admin,
        }
    }
}

impl From<&InstallAction> for RawAction {
    fn from(action: &InstallAction) -> Self {
        let mut raw = RawAction {
            kind: Some(action.kind.type_name().to_string()),
            requires_admin: action.requires_admin,
            ..Default::default()
        };
        match &action.kind {
            ActionKind::DownloadAndRun { args } => raw.args = args.clone(),
            ActionKind::Download { url, file_name } => {
                raw.url = url.clone();
                raw.file_name = file_name.clone();
            }
            ActionKind::Extract {
                archive,
                destination,
                args,
            } => {
                raw.archive = archive.clone();
                raw.destination = destination.clone();
                raw.args = args.clone();
            }
            ActionKind::RunCommand { command } => raw.command = command.clone(),
            ActionKind::RunScript { path, args } => {
                raw.path = path.clone();
                raw.args = args.clone();
            }
            ActionKind::OpenFile { path } => raw.path = path.clone(),
            ActionKind::CreateShortcut {
                target,
                shortcut_name,
            } => {
                raw.target = target.clone();
                raw.shortcut_name = shortcut_name.clone();
            }
            ActionKind::Unknown { .. } => {}
        }
        raw
    }
}

impl<'de> Deserialize<'de> for InstallAction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawAction::deserialize(deserializer).map(InstallAction::from)
    }
}

impl Serialize for InstallAction {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        RawAction::from(self).serialize(serializer)
    }
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::DownloadAndRun { .. } => "DownloadAndRun",
            ActionKind::Download { .. } => "Download",
            ActionKind::Extract { .. } => "Extract",
            ActionKind::RunCommand { .. } => "RunCommand",
            ActionKind::RunScript { .. } => "RunScript",
            ActionKind::OpenFile { .. } => "OpenFile",
            ActionKind::CreateShortcut { .. } => "CreateShortcut",
            ActionKind::Unknown { .. } => "Unknown",
        }
    }

    /// The catalog's `Type` value, including unrecognised ones.
    pub fn type_name(&self) -> &str {
        match self {
            ActionKind::Unknown { type_name } => type_name,
            other => other.name(),
        }
    }

    /// Returns a copy with every string field resolved against `ctx`.
    pub fn resolve(&self, ctx: &Context) -> ActionKind {
        match self {
            ActionKind::DownloadAndRun { args } => ActionKind::DownloadAndRun {
                args: ctx.resolve_opt(args.as_ref()),
            },
            ActionKind::Download { url, file_name } => ActionKind::Download {
                url: ctx.resolve_opt(url.as_ref()),
                file_name: ctx.resolve_opt(file_name.as_ref()),
            },
            ActionKind::Extract {
                archive,
                destination,
                args,
            } => ActionKind::Extract {
                archive: ctx.resolve_opt(archive.as_ref()),
                destination: ctx.resolve_opt(destination.as_ref()),
                args: ctx.resolve_opt(args.as_ref()),
            },
            ActionKind::RunCommand { command } => ActionKind::RunCommand {
                command: ctx.resolve_opt(command.as_ref()),
            },
            ActionKind::RunScript { path, args } => ActionKind::RunScript {
                path: ctx.resolve_opt(path.as_ref()),
                args: ctx.resolve_opt(args.as_ref()),
            },
            ActionKind::OpenFile { path } => ActionKind::OpenFile {
                path: ctx.resolve_opt(path.as_ref()),
            },
            ActionKind::CreateShortcut {
                target,
                shortcut_name,
            } => ActionKind::CreateShortcut {
                target: ctx.resolve_opt(target.as_ref()),
                shortcut_name: ctx.resolve_opt(shortcut_name.as_ref()),
            },
            ActionKind::Unknown { type_name } => ActionKind::Unknown {
                type_name: type_name.clone(),
            },
        }
    }
}

impl InstallAction {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            requires_admin: false,
        }
    }

    pub fn admin(kind: ActionKind) -> Self {
        Self {
            kind,
            requires_admin: true,
        }
    }

    pub fn resolve(&self, ctx: &Context) -> InstallAction {
        InstallAction {
            kind: self.kind.resolve(ctx),
            requires_admin: self.requires_admin,
        }
    }

    pub fn kind_name(&self) -> &str {
        self.kind.type_name()
    }
}
