use crate::completion::CompletionIndex;
use crate::exec::{CaptureReport, ExecError, HandoffReport, Invocation};
use crate::input::Action;
use crate::model::{LogLine, ToolSettings};
use chrono::Local;

const SET_ENV_TOKEN: &str = ":e ";
const LIST_COMMAND: &str = ":gp";
const LOGS_TOKEN: &str = ":l ";
const COMMAND_HELP: &str = ":e <namespace>  :gp  :l <pod>  :q";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    ListWorkloads {
        namespace: String,
        invocation: Invocation,
    },
    ShowLogs {
        namespace: String,
        unit: String,
        query: Invocation,
        pager: Invocation,
    },
}

/// One entry of the dispatch table. Rules are tried in order and the first
/// one whose matcher accepts the line handles it.
struct CommandRule {
    name: &'static str,
    matches: fn(&App, &str) -> bool,
    handle: fn(&mut App, &str) -> AppCommand,
}

const COMMAND_RULES: [CommandRule; 6] = [
    CommandRule {
        name: "quit",
        matches: is_quit_line,
        handle: App::quit_command,
    },
    CommandRule {
        name: "set-environment",
        matches: is_set_env_line,
        handle: App::set_environment,
    },
    CommandRule {
        name: "require-environment",
        matches: namespace_unset,
        handle: App::reject_without_environment,
    },
    CommandRule {
        name: "list-workloads",
        matches: is_list_line,
        handle: App::list_workloads,
    },
    CommandRule {
        name: "show-logs",
        matches: is_logs_line,
        handle: App::show_logs,
    },
    CommandRule {
        name: "unknown",
        matches: any_line,
        handle: App::unknown_command,
    },
];

pub struct App {
    running: bool,
    tools: ToolSettings,
    namespace: String,
    input: String,
    selected_unit: String,
    log_title: String,
    log: Vec<LogLine>,
    log_scroll: u16,
    log_page_size: u16,
    hint: Option<String>,
    completions: CompletionIndex,
}

impl App {
    pub fn new(tools: ToolSettings, namespace: Option<String>) -> Self {
        let namespace = namespace
            .map(|namespace| namespace.trim().to_string())
            .unwrap_or_default();
        let log = if namespace.is_empty() {
            vec![LogLine::info(
                "No env set, please use `:e environment` to set one",
            )]
        } else {
            vec![LogLine::info(format!("Environment `{namespace}` selected"))]
        };

        Self {
            running: true,
            tools,
            namespace,
            input: String::new(),
            selected_unit: String::new(),
            log_title: "kshell".to_string(),
            log,
            log_scroll: 0,
            log_page_size: 10,
            hint: Some(COMMAND_HELP.to_string()),
            completions: CompletionIndex::new(),
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn selected_unit(&self) -> &str {
        &self.selected_unit
    }

    pub fn log_title(&self) -> &str {
        &self.log_title
    }

    pub fn log_lines(&self) -> &[LogLine] {
        &self.log
    }

    pub fn log_scroll(&self) -> u16 {
        self.log_scroll
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn completions(&self) -> &CompletionIndex {
        &self.completions
    }

    pub fn status_line(&self) -> String {
        if self.namespace.is_empty() {
            "Env: NONE".to_string()
        } else {
            format!("Env: {}", self.namespace)
        }
    }

    pub fn set_log_page_size(&mut self, rows: u16) {
        self.log_page_size = rows.max(1);
        self.log_scroll = self.log_scroll.min(self.log_max_scroll());
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        match action {
            Action::Quit => {
                self.running = false;
                AppCommand::None
            }
            Action::SubmitInput => {
                if self.input.is_empty() {
                    return AppCommand::None;
                }
                let line = std::mem::take(&mut self.input);
                self.hint = None;
                self.execute_command_line(&line)
            }
            Action::CompleteInput => {
                self.complete_input();
                AppCommand::None
            }
            Action::CancelInput => {
                self.input.clear();
                AppCommand::None
            }
            Action::Backspace => {
                self.input.pop();
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.input.push(c);
                AppCommand::None
            }
            Action::ScrollUp => {
                self.scroll_log(-1);
                AppCommand::None
            }
            Action::ScrollDown => {
                self.scroll_log(1);
                AppCommand::None
            }
            Action::PageUp => {
                self.scroll_log(-(self.log_page_size as isize));
                AppCommand::None
            }
            Action::PageDown => {
                self.scroll_log(self.log_page_size as isize);
                AppCommand::None
            }
            Action::Top => {
                self.log_scroll = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.log_scroll = self.log_max_scroll();
                AppCommand::None
            }
        }
    }

    /// Renders a finished listing into the log pane. Only a clean exit
    /// refreshes the completion candidates.
    pub fn apply_listing(&mut self, result: Result<CaptureReport, ExecError>) {
        let report = match result {
            Ok(report) => report,
            Err(error) => {
                self.log.push(LogLine::error(error.to_string()));
                return;
            }
        };

        self.log_title = format!(
            "{}  {}",
            report.invocation,
            Local::now().format("%H:%M:%S")
        );
        if report.output.is_empty() {
            self.log.push(LogLine::info("(no output)"));
        }
        let mut remaining = report.output.span();
        while !remaining.is_empty() {
            let line = remaining.split_on(b'\n').trim_end_cr();
            self.log.push(LogLine::output(line.to_string_lossy()));
        }

        if report.exit.success() {
            self.completions.rebuild(report.output.span());
            self.hint = Some(format!(
                "{} completion candidates",
                self.completions.len()
            ));
        } else {
            self.log
                .push(LogLine::error(report.exit.describe(&report.invocation.program)));
        }
    }

    /// Records how the log viewer chain ended.
    pub fn apply_handoff(&mut self, unit: &str, result: anyhow::Result<HandoffReport>) {
        match result {
            Ok(report) if report.query.success() && report.pager.success() => {
                self.log
                    .push(LogLine::info(format!("Closed logs for pod `{unit}`")));
            }
            Ok(report) => {
                if !report.query.success() {
                    self.log.push(LogLine::warn(
                        report.query.describe(&self.tools.query_tool),
                    ));
                }
                if !report.pager.success() {
                    self.log
                        .push(LogLine::warn(report.pager.describe(&self.tools.pager)));
                }
            }
            Err(error) => {
                self.log
                    .push(LogLine::error(format!("Logs failed for `{unit}`: {error:#}")));
            }
        }
    }

    fn execute_command_line(&mut self, line: &str) -> AppCommand {
        for rule in &COMMAND_RULES {
            if (rule.matches)(self, line) {
                tracing::debug!(rule = rule.name, "dispatching {line:?}");
                return (rule.handle)(self, line);
            }
        }

        AppCommand::None
    }

    fn quit_command(&mut self, _line: &str) -> AppCommand {
        self.running = false;
        AppCommand::None
    }

    fn set_environment(&mut self, line: &str) -> AppCommand {
        let name = remainder_after(line, SET_ENV_TOKEN);
        if name.is_empty() {
            self.hint = Some("Usage: :e <namespace>".to_string());
            return AppCommand::None;
        }

        self.namespace = name.to_string();
        self.replace_log(
            "Environment",
            LogLine::info(format!("Changing environment to `{name}`")),
        );
        AppCommand::None
    }

    fn reject_without_environment(&mut self, _line: &str) -> AppCommand {
        self.replace_log(
            "Environment",
            LogLine::warn("No env set, please use `:e environment` to set one"),
        );
        AppCommand::None
    }

    fn list_workloads(&mut self, _line: &str) -> AppCommand {
        let mut args = self.tools.list_args.clone();
        args.push(self.tools.namespace_flag.clone());
        args.push(self.namespace.clone());
        let invocation = Invocation::new(self.tools.query_tool.clone(), args);

        self.replace_log(
            invocation.to_string(),
            LogLine::info(format!("Getting info from {}", self.tools.query_tool)),
        );
        AppCommand::ListWorkloads {
            namespace: self.namespace.clone(),
            invocation,
        }
    }

    fn show_logs(&mut self, line: &str) -> AppCommand {
        let unit = remainder_after(line, LOGS_TOKEN);
        if unit.is_empty() {
            self.hint = Some("Usage: :l <pod>".to_string());
            return AppCommand::None;
        }

        self.selected_unit = unit.to_string();
        let mut args = self.tools.logs_args.clone();
        args.push(self.selected_unit.clone());
        args.push(self.tools.namespace_flag.clone());
        args.push(self.namespace.clone());
        let query = Invocation::new(self.tools.query_tool.clone(), args);
        let pager = Invocation::new(self.tools.pager.clone(), self.tools.pager_args.clone());

        self.replace_log(
            format!("{query} | {pager}"),
            LogLine::info(format!("Getting logs from pod `{unit}`")),
        );
        AppCommand::ShowLogs {
            namespace: self.namespace.clone(),
            unit: self.selected_unit.clone(),
            query,
            pager,
        }
    }

    fn unknown_command(&mut self, line: &str) -> AppCommand {
        self.hint = Some(format!("Unknown command `{}` ({COMMAND_HELP})", line.trim()));
        AppCommand::None
    }

    fn complete_input(&mut self) {
        let start = self
            .input
            .char_indices()
            .rev()
            .find(|(_, ch)| ch.is_whitespace())
            .map(|(index, ch)| index + ch.len_utf8())
            .unwrap_or(0);
        let Some(candidate) = self.completions.complete(&self.input[start..]) else {
            return;
        };

        let candidate = candidate.to_string();
        self.input.truncate(start);
        self.input.push_str(&candidate);
    }

    fn replace_log(&mut self, title: impl Into<String>, first: LogLine) {
        self.log_title = title.into();
        self.log = vec![first];
        self.log_scroll = 0;
    }

    fn scroll_log(&mut self, delta: isize) {
        let next = (self.log_scroll as isize + delta).clamp(0, self.log_max_scroll() as isize);
        self.log_scroll = next as u16;
    }

    fn log_max_scroll(&self) -> u16 {
        let lines = self.log.len().min(u16::MAX as usize) as u16;
        lines.saturating_sub(self.log_page_size)
    }
}

fn is_quit_line(_app: &App, line: &str) -> bool {
    matches!(line.trim(), ":q" | ":quit")
}

fn is_set_env_line(_app: &App, line: &str) -> bool {
    line.contains(SET_ENV_TOKEN)
}

fn namespace_unset(app: &App, _line: &str) -> bool {
    app.namespace.is_empty()
}

fn is_list_line(_app: &App, line: &str) -> bool {
    line.trim() == LIST_COMMAND
}

fn is_logs_line(_app: &App, line: &str) -> bool {
    line.contains(LOGS_TOKEN)
}

fn any_line(_app: &App, _line: &str) -> bool {
    true
}

fn remainder_after<'a>(line: &'a str, token: &str) -> &'a str {
    line.find(token)
        .map(|index| line[index + token.len()..].trim())
        .unwrap_or_default()
}
