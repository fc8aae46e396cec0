//! 阻塞式用户交互（确认 / 提示 / 状态栏）的可注入接口

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Mutex;

pub trait Prompter {
    /// 询问用户，返回是否同意
    fn confirm(&self, message: &str) -> bool;

    /// 提示信息，用户确认后返回
    fn alert(&self, message: &str);

    /// 更新登录状态指示器
    fn status(&self, text: &str);
}

/// 终端实现：stdout 输出，stdin 读取 y/N
#[derive(Debug, Default)]
pub struct TerminalPrompter {
    /// 为真时所有确认自动通过（`--yes`）
    pub assume_yes: bool,
}

impl TerminalPrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", message);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => false,
            Ok(_) => parse_answer(&line),
        }
    }

    fn alert(&self, message: &str) {
        println!("{}", message);
    }

    fn status(&self, text: &str) {
        if !text.is_empty() {
            println!("{}", text);
        }
    }
}

fn parse_answer(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// 脚本化实现：按顺序回放预设的确认结果，并记录所有输出
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<bool>>,
    log: Mutex<Vec<Prompt>>,
}

/// 记录下来的一次交互
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Confirm(String),
    Alert(String),
    Status(String),
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter_map(|p| match p {
                Prompt::Alert(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn record(&self, prompt: Prompt) {
        if let Ok(mut log) = self.log.lock() {
            log.push(prompt);
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str) -> bool {
        self.record(Prompt::Confirm(message.to_string()));
        // 答案用完时按拒绝处理
        self.answers
            .lock()
            .ok()
            .and_then(|mut a| a.pop_front())
            .unwrap_or(false)
    }

    fn alert(&self, message: &str) {
        self.record(Prompt::Alert(message.to_string()));
    }

    fn status(&self, text: &str) {
        self.record(Prompt::Status(text.to_string()));
    }
}
