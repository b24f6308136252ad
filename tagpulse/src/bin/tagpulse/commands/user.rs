use anyhow::Result;
use clap::Subcommand;
use tagpulse::{Broadcaster, Role, Store};

use crate::app::App;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Registration",
    commands: &[
        "tagpulse user register new@example.com               # Register a regular user",
        "tagpulse user register boss@example.com --role admin # Register an admin",
    ],
}];

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new user
    #[command(name = "register")]
    Register {
        /// Email address (case-insensitive, must be unique)
        email: String,

        /// Role: admin or user
        #[arg(long, default_value = "user")]
        role: Role,
    },
}

pub async fn handle_user_commands<S, B>(command: UserCommands, app: &App<S, B>, output: &OutputManager) -> Result<()>
where
    S: Store,
    B: Broadcaster,
{
    match command {
        UserCommands::Register { email, role } => {
            let user = app.content().register_user(&email, role).await?;
            output.success(&format!("Registered {}", user.email));
            output.display(&user)?;
        }
    }
    Ok(())
}
