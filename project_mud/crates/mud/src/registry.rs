use std::collections::BTreeMap;

use futures_util::future::BoxFuture;

use crate::error::{CommandError, DispatchError};

pub const HELP_HEADER: &str = "These are all of the available Game Commands:";

/// A command handler. `None` means the command was given no arguments.
pub type Handler<C> =
    for<'a> fn(&'a mut C, Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>>;

/// What a command expects after its keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Arguments are ignored.
    None,
    /// The handler decides; it reports `CommandError::Usage` when the
    /// argument is missing or malformed.
    Args,
}

pub struct Command<C> {
    pub keyword: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub arity: Arity,
    pub handler: Handler<C>,
    /// Aliases run like their target but are left out of `help`.
    pub listed: bool,
}

impl<C> Clone for Command<C> {
    fn clone(&self) -> Self {
        Self {
            keyword: self.keyword,
            description: self.description,
            usage: self.usage,
            arity: self.arity,
            handler: self.handler,
            listed: self.listed,
        }
    }
}

impl<C> Command<C> {
    pub fn new(
        keyword: &'static str,
        description: &'static str,
        usage: &'static str,
        arity: Arity,
        handler: Handler<C>,
    ) -> Self {
        Self {
            keyword,
            description,
            usage,
            arity,
            handler,
            listed: true,
        }
    }
}

/// Split raw input into a lower-cased keyword and an optional trimmed
/// argument string. Only the first space separates the two.
pub fn parse(input: &str) -> Option<(String, Option<&str>)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (keyword, rest) = match trimmed.split_once(' ') {
        Some((k, r)) => (k, r.trim()),
        None => (trimmed, ""),
    };
    let args = if rest.is_empty() { None } else { Some(rest) };
    Some((keyword.to_lowercase(), args))
}

/// Keyword → command table for one session state. Tables are layered:
/// a state starts from another state's table and adds or removes entries.
pub struct CommandRegistry<C> {
    commands: BTreeMap<&'static str, Command<C>>,
}

impl<C> Clone for CommandRegistry<C> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<C> Default for CommandRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CommandRegistry<C> {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    pub fn with(mut self, command: Command<C>) -> Self {
        self.commands.insert(command.keyword, command);
        self
    }

    pub fn without(mut self, keyword: &str) -> Self {
        self.commands.remove(keyword);
        self
    }

    /// Register `alias` as another keyword for an existing command.
    pub fn alias(mut self, alias: &'static str, target: &str) -> Self {
        if let Some(cmd) = self.commands.get(target).cloned() {
            self.commands.insert(
                alias,
                Command {
                    keyword: alias,
                    listed: false,
                    ..cmd
                },
            );
        }
        self
    }

    pub fn get(&self, keyword: &str) -> Option<&Command<C>> {
        self.commands.get(keyword)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.commands.contains_key(keyword)
    }

    /// Listed keywords in order.
    pub fn keywords(&self) -> Vec<&'static str> {
        self.commands
            .values()
            .filter(|c| c.listed)
            .map(|c| c.keyword)
            .collect()
    }

    /// The text sent by `help`.
    pub fn help_text(&self) -> String {
        let mut text = String::from(HELP_HEADER);
        for cmd in self.commands.values().filter(|c| c.listed) {
            text.push_str("\n    ");
            text.push_str(cmd.keyword);
            text.push_str(" => ");
            text.push_str(cmd.description);
        }
        text
    }

    /// Parse `input` and run the matching handler against `ctx`.
    ///
    /// Arguments given to a command that takes none are dropped. A handler
    /// that reports `Usage` surfaces as the command's usage string.
    pub async fn dispatch(&self, ctx: &mut C, input: &str) -> Result<(), DispatchError> {
        let (keyword, args) = parse(input).ok_or(DispatchError::Empty)?;
        let cmd = self
            .commands
            .get(keyword.as_str())
            .ok_or_else(|| DispatchError::Unknown(keyword.clone()))?;

        let args = match cmd.arity {
            Arity::None => None,
            Arity::Args => args,
        };

        tracing::debug!(command = cmd.keyword, has_args = args.is_some(), "Dispatching");

        match (cmd.handler)(ctx, args).await {
            Ok(()) => Ok(()),
            Err(CommandError::Usage) => Err(DispatchError::Usage(cmd.usage.to_string())),
            Err(e) => Err(DispatchError::Command(e)),
        }
    }
}
