#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum LogTone {
    Output,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogLine {
    pub tone: LogTone,
    pub text: String,
}

impl LogLine {
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            tone: LogTone::Output,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            tone: LogTone::Info,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            tone: LogTone::Warn,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            tone: LogTone::Error,
            text: text.into(),
        }
    }
}

/// Programs and argument shapes used to talk to the cluster.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ToolSettings {
    pub query_tool: String,
    pub namespace_flag: String,
    pub list_args: Vec<String>,
    pub logs_args: Vec<String>,
    pub pager: String,
    pub pager_args: Vec<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            query_tool: "kubectl".to_string(),
            namespace_flag: "-n".to_string(),
            list_args: vec!["get".to_string(), "pods".to_string()],
            logs_args: vec!["logs".to_string()],
            pager: "less".to_string(),
            pager_args: Vec::new(),
        }
    }
}
