use futures_util::future::BoxFuture;
use net::{Directive, Packet};

use crate::commands::welcome;
use crate::context::Session;
use crate::error::CommandError;
use crate::registry::{Arity, Command, CommandRegistry};

/// Commands available in every state.
pub fn registry() -> CommandRegistry<Session> {
    CommandRegistry::new()
        .with(Command::new(
            "help",
            "Displays this help message.",
            "Proper usage is 'help'.",
            Arity::None,
            help,
        ))
        .with(Command::new(
            "clear",
            "Clears the game history.",
            "Proper usage is 'clear'.",
            Arity::None,
            clear,
        ))
}

pub fn logout_command() -> Command<Session> {
    Command::new(
        "logout",
        "Log out of the game.",
        "Proper usage is 'logout'.",
        Arity::None,
        logout,
    )
}

fn help<'a>(s: &'a mut Session, _args: Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let text = s.registry().help_text();
        s.send_text(text)
    })
}

fn clear<'a>(
    s: &'a mut Session,
    _args: Option<&'a str>,
) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move { s.send(Packet::new(welcome(s.state), Directive::ClearLog)) })
}

fn logout<'a>(
    s: &'a mut Session,
    _args: Option<&'a str>,
) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        s.finish().await;
        s.close_with(Packet::disconnect("Goodbye!"))
    })
}
