//! crates/couplequest_client/src/repl.rs
//!
//! The line-oriented front end. Each input line parses into a [`Command`],
//! which is forwarded to the controller; the screen for the current view is
//! rendered back as plain text.

use couplequest_core::{
    Availability, Budget, Controller, DateIdea, DistancePreference, MainContent, UserProfile,
    View,
};
use rand::Rng;
use std::fmt::Write as _;
use std::io::{self, Write};

pub const HELP: &str = "\
Commands:
  login <email>                        sign in (or switch user)
  profile <interests> | <budgets> | <availability>
                                       save your profile, e.g. `profile hiking, food | $, $$ | Weekends`
  generate                             get a new date idea
  fav [id]                             favourite or unfavourite an idea (the shown one by default)
  select <id>                          show an idea from history or favourites
  history                              list past ideas, newest first
  favorites                            list favourite ideas
  distance <local|day_trip|any>        how far you are willing to go
  location [city or postal code]       set a manual location, or retry the device position
  reset                                edit your profile (history is kept)
  logout                               sign out
  help                                 show this list
  quit                                 leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login(String),
    Profile(UserProfile),
    Generate,
    Favorite(Option<String>),
    Select(String),
    History,
    Favorites,
    Distance(DistancePreference),
    Location(Option<String>),
    Reset,
    Logout,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command `{0}`. Type `help` for a list.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Unknown budget `{0}`. Use Free, $, $$ or $$$.")]
    Budget(String),
    #[error("Unknown availability `{0}`. Use Weekdays, Weekends or Anytime.")]
    Availability(String),
    #[error("Unknown distance `{0}`. Use local, day_trip or any.")]
    Distance(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let argument = (!rest.is_empty()).then(|| rest.to_string());

        match word.to_ascii_lowercase().as_str() {
            "login" => argument
                .map(Command::Login)
                .ok_or(CommandError::Usage("login <email>")),
            "profile" => parse_profile(rest).map(Command::Profile),
            "generate" | "g" => Ok(Command::Generate),
            "fav" | "favorite" | "favourite" => Ok(Command::Favorite(argument)),
            "select" => argument
                .map(Command::Select)
                .ok_or(CommandError::Usage("select <id>")),
            "history" => Ok(Command::History),
            "favorites" | "favourites" => Ok(Command::Favorites),
            "distance" => DistancePreference::parse(rest)
                .map(Command::Distance)
                .ok_or_else(|| CommandError::Distance(rest.to_string())),
            "location" => Ok(Command::Location(argument)),
            "reset" => Ok(Command::Reset),
            "logout" => Ok(Command::Logout),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

/// `interests | budgets | availability`; omitted choices keep the form defaults.
fn parse_profile(rest: &str) -> Result<UserProfile, CommandError> {
    let mut parts = rest.split('|').map(str::trim);
    let interests = parts.next().unwrap_or_default().to_string();
    let defaults = UserProfile::default();

    let budgets = match parts.next().filter(|p| !p.is_empty()) {
        Some(list) => split_choices(list)
            .map(|b| Budget::parse(b).ok_or_else(|| CommandError::Budget(b.to_string())))
            .collect::<Result<Vec<_>, _>>()?,
        None => defaults.preferred_budget,
    };
    let availability = match parts.next().filter(|p| !p.is_empty()) {
        Some(list) => split_choices(list)
            .map(|a| Availability::parse(a).ok_or_else(|| CommandError::Availability(a.to_string())))
            .collect::<Result<Vec<_>, _>>()?,
        None => defaults.availability,
    };

    Ok(UserProfile::new(interests, budgets, availability))
}

fn split_choices(list: &str) -> impl Iterator<Item = &str> {
    list.split([',', ' ']).map(str::trim).filter(|s| !s.is_empty())
}

//=========================================================================================
// Execution
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Applies one command and writes what the user should see next.
pub async fn execute<W, R>(
    controller: &mut Controller,
    command: Command,
    rng: &mut R,
    out: &mut W,
) -> io::Result<Flow>
where
    W: Write,
    R: Rng + ?Sized,
{
    match command {
        Command::Login(email) => match controller.login(&email) {
            Ok(()) => {
                if controller.view() == View::Main {
                    controller.request_location().await;
                }
                writeln!(out, "Signed in as {}.", email.trim())?;
            }
            Err(e) => writeln!(out, "{}", e)?,
        },
        Command::Profile(profile) => {
            if let Err(e) = controller.save_profile(profile).await {
                writeln!(out, "{}", e)?;
                return Ok(Flow::Continue);
            }
        }
        Command::Generate => {
            if controller.view() != View::Main {
                writeln!(out, "Set up your profile first.")?;
                return Ok(Flow::Continue);
            }
            if controller.generate_idea().await.is_none() {
                writeln!(out, "An idea is already on its way.")?;
            }
        }
        Command::Favorite(id) => {
            let Some(id) = id.or_else(|| controller.current_idea().map(|i| i.id.clone())) else {
                writeln!(out, "There is no idea to favourite yet.")?;
                return Ok(Flow::Continue);
            };
            let was_favorite = controller.is_favorited(&id);
            let message = match (was_favorite, controller.toggle_favorite(&id)) {
                (_, true) => "Added to favourites.",
                (true, false) => "Removed from favourites.",
                (false, false) => "No idea with that id.",
            };
            writeln!(out, "{}", message)?;
            return Ok(Flow::Continue);
        }
        Command::Select(id) => {
            if !controller.select_idea(&id) {
                writeln!(out, "No idea with that id.")?;
                return Ok(Flow::Continue);
            }
        }
        Command::History => {
            write!(out, "{}", render_list("History", controller.history(), controller))?;
            return Ok(Flow::Continue);
        }
        Command::Favorites => {
            write!(out, "{}", render_list("Favourites", controller.favorites(), controller))?;
            return Ok(Flow::Continue);
        }
        Command::Distance(preference) => {
            controller.set_distance_preference(preference);
            writeln!(out, "Distance preference: {}.", distance_label(preference))?;
            return Ok(Flow::Continue);
        }
        Command::Location(Some(text)) => match controller.set_manual_location(&text) {
            Ok(()) => writeln!(out, "Location set to {}.", controller.manual_location_query())?,
            Err(e) => {
                writeln!(out, "{}", e)?;
                return Ok(Flow::Continue);
            }
        },
        Command::Location(None) => controller.request_location().await,
        Command::Reset => controller.reset_profile(),
        Command::Logout => {
            controller.logout();
            writeln!(out, "Signed out.")?;
        }
        Command::Help => {
            writeln!(out, "{}", HELP)?;
            return Ok(Flow::Continue);
        }
        Command::Quit => return Ok(Flow::Quit),
    }

    write!(out, "{}", render_screen(controller, rng))?;
    Ok(Flow::Continue)
}

//=========================================================================================
// Rendering
//=========================================================================================

fn distance_label(preference: DistancePreference) -> &'static str {
    match preference {
        DistancePreference::Local => "local",
        DistancePreference::DayTrip => "day trip",
        DistancePreference::Any => "any distance",
    }
}

/// Renders the screen for the controller's current view.
pub fn render_screen<R: Rng + ?Sized>(controller: &Controller, rng: &mut R) -> String {
    let mut screen = String::new();
    match controller.view() {
        View::Auth => {
            screen.push_str("Welcome to CoupleQuest. Sign in with `login <email>`.\n");
        }
        View::ProfileSetup => {
            screen.push_str("Tell us about yourselves:\n");
            screen.push_str("  profile <interests> | <budgets> | <availability>\n");
        }
        View::Main => {
            if let Some(err) = controller.error().filter(|e| e.is_location_error()) {
                let _ = writeln!(screen, "{}", err);
                screen.push_str("  location <city or postal code>\n");
            }
            match controller.main_content() {
                MainContent::Loading => screen.push_str("Finding the perfect date idea...\n"),
                MainContent::Error(err) => {
                    let _ = writeln!(screen, "{}", err);
                }
                MainContent::Idea(idea) => {
                    screen.push_str(&render_idea(idea, controller.is_favorited(&idea.id)))
                }
                MainContent::Empty => {
                    screen.push_str("No idea yet. Type `generate` for your first one.\n")
                }
            }
            if let Some(ad) = controller.current_ad(rng) {
                let _ = writeln!(
                    screen,
                    "-- Sponsored: {} | {} ({})",
                    ad.advertiser, ad.headline, ad.call_to_action
                );
            }
        }
    }
    screen
}

pub fn render_idea(idea: &DateIdea, favorited: bool) -> String {
    let mut card = String::new();
    let star = if favorited { " *" } else { "" };
    let _ = writeln!(card, "== {}{} ==", idea.title, star);
    let _ = writeln!(
        card,
        "[{} | {} | {}]",
        idea.category, idea.budget, idea.time_required
    );
    let _ = writeln!(card, "{}", idea.description);
    let _ = writeln!(card, "Why it's great for you: {}", idea.couple_benefit);
    if idea.is_local && !idea.location_details.trim().is_empty() {
        let _ = writeln!(card, "Where: {}", idea.location_details);
    }
    let _ = writeln!(card, "id: {}", idea.id);
    card
}

fn render_list(heading: &str, ideas: &[DateIdea], controller: &Controller) -> String {
    let mut list = String::new();
    if ideas.is_empty() {
        let _ = writeln!(list, "{}: nothing here yet.", heading);
        return list;
    }
    let _ = writeln!(list, "{}:", heading);
    for (n, idea) in ideas.iter().enumerate() {
        let star = if controller.is_favorited(&idea.id) { " *" } else { "" };
        let _ = writeln!(list, "  {}. {}{} ({})", n + 1, idea.title, star, idea.id);
    }
    list
}
