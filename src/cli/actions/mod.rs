pub mod session;
pub mod visit;

use crate::{app::App, config::AppConfig};
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub enum Command {
    Login {
        username: String,
        password: SecretString,
        remember_me: bool,
    },
    Logout,
    Status,
    Visit {
        paths: Vec<String>,
    },
    Routes,
}

#[derive(Debug)]
pub struct Action {
    pub config: AppConfig,
    pub command: Command,
}

impl Action {
    /// Builds the client and runs the command against it.
    ///
    /// # Errors
    /// Returns an error if the client cannot be built or the command fails.
    pub async fn execute(self) -> Result<()> {
        let mut app = App::new(self.config)?;

        match self.command {
            Command::Login {
                username,
                password,
                remember_me,
            } => session::login(&app, username, password, remember_me).await,
            Command::Logout => session::logout(&mut app).await,
            Command::Status => session::status(&app).await,
            Command::Visit { paths } => visit::visit(&mut app, &paths).await,
            Command::Routes => {
                visit::routes(&app);
                Ok(())
            }
        }
    }
}
