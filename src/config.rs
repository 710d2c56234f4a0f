use crate::cli::CliArgs;
use crate::model::ToolSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub source: Option<String>,
    pub tools: ToolSettings,
    pub namespace: Option<String>,
    pub capture_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct KshellConfigFile {
    #[serde(default, alias = "tool", alias = "kubectl")]
    query_tool: Option<String>,
    #[serde(default)]
    namespace_flag: Option<String>,
    #[serde(default)]
    list_args: Option<Vec<String>>,
    #[serde(default)]
    logs_args: Option<Vec<String>>,
    #[serde(default)]
    pager: Option<String>,
    #[serde(default)]
    pager_args: Option<Vec<String>>,
    #[serde(default, alias = "timeout", alias = "timeout_secs")]
    capture_timeout_secs: Option<u64>,
    #[serde(default, alias = "env")]
    namespace: Option<String>,
}

impl ShellConfig {
    /// Resolves settings with CLI flags over the config file over defaults.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = match &args.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file {} does not exist", path.display());
                }
                Some(path.clone())
            }
            None => discover_config_path(),
        };

        let file = match &path {
            Some(path) => read_config_file(path)?,
            None => KshellConfigFile::default(),
        };

        Ok(Self::merge(
            path.map(|path| path.display().to_string()),
            file,
            args,
        ))
    }

    fn merge(source: Option<String>, file: KshellConfigFile, args: &CliArgs) -> Self {
        let defaults = ToolSettings::default();
        let pager = args
            .pager
            .clone()
            .or(file.pager)
            .or_else(|| {
                std::env::var("PAGER")
                    .ok()
                    .filter(|pager| !pager.trim().is_empty())
            })
            .unwrap_or(defaults.pager);

        let tools = ToolSettings {
            query_tool: args
                .query_tool
                .clone()
                .or(file.query_tool)
                .unwrap_or(defaults.query_tool),
            namespace_flag: file.namespace_flag.unwrap_or(defaults.namespace_flag),
            list_args: file.list_args.unwrap_or(defaults.list_args),
            logs_args: file.logs_args.unwrap_or(defaults.logs_args),
            pager,
            pager_args: file.pager_args.unwrap_or(defaults.pager_args),
        };

        let timeout_secs = args
            .capture_timeout_secs
            .or(file.capture_timeout_secs)
            .unwrap_or(DEFAULT_CAPTURE_TIMEOUT_SECS);

        Self {
            source,
            tools,
            namespace: args
                .namespace
                .clone()
                .or(file.namespace)
                .filter(|namespace| !namespace.trim().is_empty()),
            capture_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }
}

fn read_config_file(path: &Path) -> Result<KshellConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(KshellConfigFile::default());
    }
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("KSHELL_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kshell.yaml"),
        PathBuf::from("kshell.yml"),
        PathBuf::from(".kshell.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/kshell/config.yaml"),
            PathBuf::from(&home).join(".config/kshell/config.yml"),
            PathBuf::from(&home).join(".kshell.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{KshellConfigFile, ShellConfig, read_config_file};
    use crate::cli::CliArgs;
    use std::io::Write;
    use std::time::Duration;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn file_values_are_loaded() {
        let file = write_config(
            "query_tool: oc\nnamespace_flag: --namespace\nlist_args: [get, workloads]\nlogs_args: [logs, -f]\npager: more\npager_args: [-R]\ncapture_timeout_secs: 5\nnamespace: staging\n",
        );
        let args = CliArgs {
            config: Some(file.path().to_path_buf()),
            ..CliArgs::default()
        };

        let config = ShellConfig::load(&args).expect("config");
        assert_eq!(config.tools.query_tool, "oc");
        assert_eq!(config.tools.namespace_flag, "--namespace");
        assert_eq!(config.tools.list_args, vec!["get", "workloads"]);
        assert_eq!(config.tools.logs_args, vec!["logs", "-f"]);
        assert_eq!(config.tools.pager, "more");
        assert_eq!(config.tools.pager_args, vec!["-R"]);
        assert_eq!(config.capture_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.namespace.as_deref(), Some("staging"));
        assert!(config.source.is_some());
    }

    #[test]
    fn cli_overrides_file() {
        let file = write_config("query_tool: oc\npager: more\nnamespace: staging\n");
        let args = CliArgs {
            config: Some(file.path().to_path_buf()),
            namespace: Some("prod".to_string()),
            query_tool: Some("kubectl".to_string()),
            pager: Some("less".to_string()),
            capture_timeout_secs: Some(0),
            ..CliArgs::default()
        };

        let config = ShellConfig::load(&args).expect("config");
        assert_eq!(config.tools.query_tool, "kubectl");
        assert_eq!(config.tools.pager, "less");
        assert_eq!(config.namespace.as_deref(), Some("prod"));
        assert_eq!(config.capture_timeout, None);
    }

    #[test]
    fn defaults_apply_without_file() {
        let args = CliArgs {
            pager: Some("less".to_string()),
            ..CliArgs::default()
        };
        let config = ShellConfig::merge(None, KshellConfigFile::default(), &args);
        assert_eq!(config.tools.query_tool, "kubectl");
        assert_eq!(config.tools.list_args, vec!["get", "pods"]);
        assert_eq!(config.tools.namespace_flag, "-n");
        assert_eq!(config.capture_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let args = CliArgs {
            config: Some("/definitely/not/here/kshell.yaml".into()),
            ..CliArgs::default()
        };
        assert!(ShellConfig::load(&args).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("qurey_tool: oc\n");
        assert!(read_config_file(file.path()).is_err());
    }

    #[test]
    fn empty_file_is_default() {
        let file = write_config("\n");
        let parsed = read_config_file(file.path()).expect("empty config");
        assert!(parsed.query_tool.is_none());
    }
}
