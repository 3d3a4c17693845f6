// src/cli.rs
use clap::{Parser, Subcommand};

use crate::pages::Route;

#[derive(Parser, Debug)]
#[command(name = "clubs", version, about = "Interest clubs in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Run interactive TUI
    Run {
        #[command(subcommand)]
        screen: Screen,
    },
    /// Print recently visited clubs as JSON
    Recent,
    /// Forget the stored session
    Logout,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    /// Register favorite interests
    Favorites,
    CreateClub,
    Recent,
    /// Photo gallery of one club
    Gallery {
        #[arg(long)]
        club: u64,
    },
}

impl Screen {
    pub fn route(&self) -> Route {
        match self {
            Screen::Login => Route::Login,
            Screen::Favorites => Route::Favorites,
            Screen::CreateClub => Route::CreateClub,
            Screen::Recent => Route::Recent,
            Screen::Gallery { club } => Route::Gallery(*club),
        }
    }
}
