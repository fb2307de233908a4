use std::path::PathBuf;

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use cx_agent::models::message::{Message, Role};
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config, Editor};

use super::{parse_input, Input, InputType, Prompt};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30mcx> \x1b[0m";
const THEME: &str = "GitHub";

pub struct RustylinePrompt {
    editor: Editor<(), FileHistory>,
    spinner: cliclack::ProgressBar,
    history_file: Option<PathBuf>,
}

impl RustylinePrompt {
    pub fn new(history_file: Option<PathBuf>) -> Result<Self> {
        let config = Config::builder().history_ignore_space(true).build();
        let mut editor = Editor::with_config(config)?;
        if let Some(path) = history_file.as_ref().filter(|path| path.exists()) {
            editor.load_history(path)?;
        }
        if let Some(dir) = history_file.as_ref().and_then(|path| path.parent()) {
            std::fs::create_dir_all(dir)?;
        }

        Ok(RustylinePrompt {
            editor,
            spinner: spinner(),
            history_file,
        })
    }
}

fn print_markdown(content: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();
    if let Err(e) = printed {
        tracing::debug!(error = %e, "markdown rendering failed, printing plain text");
        println!("{}", content);
    }
}

fn print_json(content: &str, title: String) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()).name(title))
        .theme(THEME)
        .language("JSON")
        .grid(true)
        .header(true)
        .wrapping_mode(WrappingMode::Character)
        .print();
    if let Err(e) = printed {
        tracing::debug!(error = %e, "json rendering failed, printing plain text");
        println!("{}", content);
    }
}

fn print_header(message: &Message, number: usize) {
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%-I:%M %p");
    let who = match message.role {
        Role::User => style("You").bold().cyan(),
        Role::Assistant if message.is_error() => style("Assistant").bold().red(),
        Role::Assistant => style("Assistant").bold().green(),
    };
    println!("{} {} {}", style(format!("[{}]", number)).dim(), who, style(time).dim());
}

fn print_tools(message: &Message) {
    let tools = message.tools();
    if tools.is_empty() {
        return;
    }
    let badges: Vec<String> = tools
        .iter()
        .map(|tool| style(format!(" {} ", tool)).on_blue().white().to_string())
        .collect();
    println!("{} {}", style("Tools Used:").dim(), badges.join(" "));
}

fn print_citations(message: &Message) {
    let citations = message.citations();
    if citations.is_empty() {
        return;
    }
    println!("{}", style(format!("Sources ({})", citations.len())).blue());
    for (i, citation) in citations.iter().enumerate() {
        let relevance = citation
            .relevance()
            .map(|score| format!(" relevance {:.2}", score))
            .unwrap_or_default();
        println!(
            "  {}: {}{}",
            style(format!("Source {}", i + 1)).bold(),
            citation.source_name(),
            style(relevance).dim()
        );
        if let Some(uri) = &citation.s3_uri {
            println!("    {}", style(uri).dim());
        }
    }
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, message: &Message, number: usize) {
        print_header(message, number);
        match message.role {
            Role::User => println!("{}", message.content),
            Role::Assistant => {
                if message.content.is_empty() {
                    println!("{}", style("No response from agent").dim().italic());
                } else {
                    print_markdown(&message.content);
                }
                print_tools(message);
                print_citations(message);
                println!(
                    "{}",
                    style(format!(
                        "/feedback {} up|down [comment]  ·  /details {}",
                        number, number
                    ))
                    .dim()
                );
            }
        }
        println!();
    }

    fn render_details(&mut self, number: usize, details: &str) {
        print_json(details, format!("Message {} details", number));
    }

    fn notify(&mut self, text: &str) {
        println!("{}", style(text).yellow());
    }

    fn get_input(&mut self) -> Result<Input> {
        match self.editor.readline(PROMPT) {
            Ok(line) => {
                self.editor.add_history_entry(line.as_str())?;
                Ok(parse_input(&line))
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use 'exit' to quit");
                Ok(Input::of(InputType::AskAgain))
            }
            Err(ReadlineError::Eof) => Ok(Input::of(InputType::Exit)),
            Err(err) => Err(err.into()),
        }
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("Thinking...");
    }

    fn hide_busy(&self) {
        self.spinner.stop("");
    }

    fn close(&mut self) {
        if let Some(path) = &self.history_file {
            if let Err(e) = self.editor.save_history(path) {
                tracing::debug!(error = %e, "could not save history");
            }
        }
    }
}
