use futures_util::future::BoxFuture;
use net::{Directive, Packet};
use session::SessionState;

use crate::commands::{base, welcome};
use crate::context::Session;
use crate::error::CommandError;
use crate::registry::{Arity, Command, CommandRegistry};

pub const WELCOME: &str = "";

pub const ALREADY_LOGGED_IN: &str = "That account is already logged in.";
pub const LOGIN_FAILED: &str = "Login failed. Please check your account name and/or password.";

pub fn registry() -> CommandRegistry<Session> {
    base::registry()
        .with(Command::new(
            "create_account",
            "Creates a new server account.",
            "Proper usage is 'create_account [account name] [password]'.",
            Arity::Args,
            create_account,
        ))
        .with(Command::new(
            "login",
            "Logs a user into the game.",
            "Proper usage is 'login [account name] [password]'.",
            Arity::Args,
            login,
        ))
}

/// Exactly two whitespace-separated words.
fn credentials(args: Option<&str>) -> Result<(String, String), CommandError> {
    let mut words = args.ok_or(CommandError::Usage)?.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(name), Some(password), None) => Ok((name.to_string(), password.to_string())),
        _ => Err(CommandError::Usage),
    }
}

fn login<'a>(s: &'a mut Session, args: Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let (name, password) = credentials(args)?;

        let held = s.game.sessions.read().await.account_holder(&name);
        if held.is_some_and(|holder| holder != s.id) {
            tracing::info!(session_id = ?s.id, account = %name, "Login refused: account in use");
            return s.close_with(Packet::new(ALREADY_LOGGED_IN, Directive::LoginFalse));
        }

        let lookup = name.clone();
        let account = match s.gateway(move |gw| gw.log_in(&lookup, &password)).await {
            Ok(account) => account,
            Err(CommandError::Gateway(e)) => {
                tracing::info!(session_id = ?s.id, account = %name, error = %e, "Login failed");
                return s.close_with(Packet::new(LOGIN_FAILED, Directive::LoginFalse));
            }
            Err(e) => return Err(e),
        };

        // Another connection may have logged in while the gateway ran.
        let claimed = s.game.sessions.write().await.claim_account(s.id, &account.name);
        if claimed.is_err() {
            tracing::info!(
                session_id = ?s.id,
                account = %account.name,
                "Login refused: account in use"
            );
            return s.close_with(Packet::new(ALREADY_LOGGED_IN, Directive::LoginFalse));
        }

        tracing::info!(session_id = ?s.id, account = %account.name, "Logged in");
        s.account = Some(account);
        s.enter(SessionState::LoggedIn);
        s.send(Packet::new("Logging in.", Directive::LoginTrue))?;
        s.send_text(welcome(SessionState::LoggedIn))
    })
}

fn create_account<'a>(
    s: &'a mut Session,
    args: Option<&'a str>,
) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let (name, password) = credentials(args)?;

        let created = name.clone();
        let account = match s.gateway(move |gw| gw.create(&created, &password)).await {
            Ok(account) => account,
            Err(CommandError::Gateway(e)) => {
                tracing::info!(
                    session_id = ?s.id,
                    account = %name,
                    error = %e,
                    "Account creation failed"
                );
                return s.close_with(Packet::new("", Directive::Disconnect));
            }
            Err(e) => return Err(e),
        };

        if s.game.sessions.write().await.claim_account(s.id, &account.name).is_err() {
            return s.close_with(Packet::new("", Directive::Disconnect));
        }

        s.account = Some(account);
        s.enter(SessionState::LoggedIn);
        s.send(Packet::new("", Directive::ServCreateAccount))?;
        s.send_text(welcome(SessionState::LoggedIn))
    })
}
