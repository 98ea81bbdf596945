//! Subcommand implementations.
//!
//! Every command drives the shared [`ApiClient`], renders the result and
//! reports notifications. Failures reported by the backend are not Rust
//! errors: they are printed and turn into [`Outcome::Failed`].

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use chrono::Local;
use clap::{Args, Subcommand};
use logbook_core::validation::validate_credentials;
use logbook_core::{
    notify, ApiClient, ApiResponse, Credentials, Level, Navigator, Notification, Sex, StatusFilter, Transport, VisitorDraft,
    VisitorFilter, VisitorId, VisitorStats,
};
use tracing::{info, warn};

use crate::{prompt, render};

const DELETE_QUESTION: &str = "Are you sure you want to delete this visitor? This action cannot be undone.";

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Show visitors with optional search and status filter
    List(FilterArgs),
    /// Register a new visitor
    Add(VisitorArgs),
    /// Edit an existing visitor
    Edit {
        id: VisitorId,
        #[command(flatten)]
        fields: VisitorArgs,
    },
    /// Administrator actions
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommand {
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    /// Show statistics, administrators and visitors
    Dashboard(FilterArgs),
    /// Record that a visitor has left
    SignOut { id: VisitorId },
    /// Delete a visitor record
    Delete {
        id: VisitorId,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Case-insensitive match on first name, last name or purpose
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long, default_value_t = StatusFilter::All)]
    pub status: StatusFilter,
}

impl FilterArgs {
    fn filter(&self) -> VisitorFilter {
        VisitorFilter::new(self.search.clone(), self.status)
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct VisitorArgs {
    #[arg(long)]
    pub firstname: Option<String>,
    #[arg(long)]
    pub middlename: Option<String>,
    #[arg(long)]
    pub lastname: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    /// male or female
    #[arg(long)]
    pub sex: Option<Sex>,
    #[arg(long = "contact")]
    pub contact_number: Option<String>,
    #[arg(long = "purpose")]
    pub purpose_of_visit: Option<String>,
}

impl VisitorArgs {
    fn is_empty(&self) -> bool {
        self.firstname.is_none()
            && self.middlename.is_none()
            && self.lastname.is_none()
            && self.age.is_none()
            && self.sex.is_none()
            && self.contact_number.is_none()
            && self.purpose_of_visit.is_none()
    }

    fn apply(&self, draft: &mut VisitorDraft) {
        if let Some(v) = &self.firstname {
            draft.firstname = v.clone();
        }
        if let Some(v) = &self.middlename {
            draft.middlename = Some(v.clone()).filter(|m| !m.is_empty());
        }
        if let Some(v) = &self.lastname {
            draft.lastname = v.clone();
        }
        if let Some(v) = self.age {
            draft.age = Some(v);
        }
        if let Some(v) = self.sex {
            draft.sex = Some(v);
        }
        if let Some(v) = &self.contact_number {
            draft.contact_number = v.clone();
        }
        if let Some(v) = &self.purpose_of_visit {
            draft.purpose_of_visit = v.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => ExitCode::SUCCESS,
            Outcome::Failed => ExitCode::FAILURE,
        }
    }
}

/// Standard output for results, standard error for failures.
pub struct Terminal<O, E> {
    pub out: O,
    pub err: E,
}

impl<O: Write, E: Write> Terminal<O, E> {
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    pub fn notify(&mut self, note: &Notification) -> io::Result<()> {
        let line = render::notification(note);
        match note.level {
            Level::Success => writeln!(self.out, "{line}"),
            Level::Error => writeln!(self.err, "{line}"),
        }
    }

    pub fn notify_all(&mut self, notes: &[Notification]) -> io::Result<()> {
        notes.iter().try_for_each(|note| self.notify(note))
    }
}

/// Turns the dashboard's login redirect into a hint on the terminal.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    redirects: AtomicUsize,
}

impl TerminalNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::Relaxed)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, location: &str) {
        self.redirects.fetch_add(1, Ordering::Relaxed);
        warn!(location, "admin session required");
        eprintln!("Administrator login required ({location}): run `logbook admin login`");
    }
}

/// A load that brought back nothing to show. A successful response without
/// a payload gets the fallback too.
fn load_failure<D>(resp: &ApiResponse<D>, fallback: &str) -> Vec<Notification> {
    if resp.success {
        vec![Notification::error(fallback)]
    } else {
        notify::failure(resp, fallback)
    }
}

pub struct Runner<T, N, O, E> {
    pub api: ApiClient<T, N>,
    pub term: Terminal<O, E>,
    /// Whether missing input may be asked for.
    pub interactive: bool,
}

impl<T: Transport, N: Navigator, O: Write, E: Write> Runner<T, N, O, E> {
    pub fn run(&mut self, command: &Command) -> Result<Outcome> {
        match command {
            Command::List(args) => self.list(args),
            Command::Add(fields) => self.add(fields),
            Command::Edit { id, fields } => self.edit(*id, fields),
            Command::Admin(AdminCommand::Login { email, password }) => {
                let credentials = Credentials {
                    email: email.clone().unwrap_or_default(),
                    password: password.clone().unwrap_or_default(),
                };
                self.login(credentials)
            }
            Command::Admin(AdminCommand::Logout) => self.logout(),
            Command::Admin(AdminCommand::Dashboard(args)) => self.dashboard(args),
            Command::Admin(AdminCommand::SignOut { id }) => self.sign_out(*id),
            Command::Admin(AdminCommand::Delete { id, yes }) => self.delete(*id, *yes),
        }
    }

    fn fail(&mut self, notes: &[Notification]) -> Result<Outcome> {
        self.term.notify_all(notes)?;
        Ok(Outcome::Failed)
    }

    fn list(&mut self, args: &FilterArgs) -> Result<Outcome> {
        let resp = self.api.get_visitors();
        let Some(visitors) = resp.data.as_ref().filter(|_| resp.success) else {
            return self.fail(&load_failure(&resp, "Failed to load visitors"));
        };

        let stats = VisitorStats::collect(visitors);
        self.term.print(&render::stats(&stats, None))?;
        self.term.print("\n")?;
        self.term
            .print(&render::visitor_list("Visitors", visitors, &args.filter(), &Local))?;
        Ok(Outcome::Done)
    }

    fn add(&mut self, fields: &VisitorArgs) -> Result<Outcome> {
        let mut draft = VisitorDraft::default();
        fields.apply(&mut draft);
        if self.interactive {
            prompt::fill_missing(&mut draft)?;
        }
        let input = match draft.validate() {
            Ok(input) => input,
            Err(errors) => return self.fail(&notify::field_errors(&errors)),
        };

        let resp = self.api.create_visitor(&input);
        if !resp.success {
            return self.fail(&notify::failure(&resp, "Failed to register visitor"));
        }
        info!(firstname = %input.firstname, lastname = %input.lastname, "visitor registered");
        self.term
            .notify(&Notification::success("Visitor registered successfully!"))?;
        if let Some(visitor) = &resp.data {
            self.term.print(&render::visitor_card(visitor, &Local))?;
        }
        Ok(Outcome::Done)
    }

    fn edit(&mut self, id: VisitorId, fields: &VisitorArgs) -> Result<Outcome> {
        let current = self.api.get_visitor(id);
        let Some(visitor) = current.data.filter(|_| current.success) else {
            warn!(id, message = ?current.message, "visitor lookup failed");
            return self.fail(&[Notification::error("Visitor not found")]);
        };

        let mut draft = VisitorDraft::from(&visitor);
        if fields.is_empty() && self.interactive {
            prompt::review(&mut draft)?;
        } else {
            fields.apply(&mut draft);
        }
        let input = match draft.validate() {
            Ok(input) => input,
            Err(errors) => return self.fail(&notify::field_errors(&errors)),
        };

        let resp = self.api.update_visitor(id, &input);
        if !resp.success {
            return self.fail(&notify::failure(&resp, "Failed to update visitor"));
        }
        info!(id, "visitor updated");
        self.term
            .notify(&Notification::success("Visitor information updated successfully!"))?;
        if let Some(visitor) = &resp.data {
            self.term.print(&render::visitor_card(visitor, &Local))?;
        }
        Ok(Outcome::Done)
    }

    fn login(&mut self, mut credentials: Credentials) -> Result<Outcome> {
        if self.interactive {
            prompt::fill_credentials(&mut credentials)?;
        }
        if let Err(errors) = validate_credentials(&credentials) {
            return self.fail(&notify::field_errors(&errors));
        }

        let resp = self.api.login(&credentials);
        if !resp.success {
            return self.fail(&notify::failure(&resp, "Invalid credentials"));
        }
        info!(email = %credentials.email, "administrator logged in");
        self.term.notify(&Notification::success("Login successful!"))?;
        self.dashboard(&FilterArgs::default())
    }

    fn logout(&mut self) -> Result<Outcome> {
        let resp = self.api.logout();
        if !resp.success {
            return self.fail(&notify::failure(&resp, "Error logging out"));
        }
        info!("administrator logged out");
        self.term.notify(&Notification::success("Logged out successfully"))?;
        Ok(Outcome::Done)
    }

    fn dashboard(&mut self, args: &FilterArgs) -> Result<Outcome> {
        let resp = self.api.get_admin_panel();
        let Some(panel) = resp.data.as_ref().filter(|_| resp.success) else {
            return self.fail(&load_failure(&resp, "Failed to load admin data"));
        };

        let stats = VisitorStats::collect(&panel.visitors);
        self.term.print("Admin Dashboard\n")?;
        self.term.print(&render::stats(&stats, Some(panel.admins.len())))?;
        if stats.active > 0 {
            self.term.print(&format!(
                "! There are {} active visitors currently signed in.\n",
                stats.active
            ))?;
        }
        self.term.print("\n")?;
        self.term.print(&render::admin_list(&panel.admins))?;
        self.term.print("\n")?;
        self.term.print(&render::visitor_list(
            "Manage Visitors",
            &panel.visitors,
            &args.filter(),
            &Local,
        ))?;
        Ok(Outcome::Done)
    }

    fn sign_out(&mut self, id: VisitorId) -> Result<Outcome> {
        let resp = self.api.timeout_visitor(id);
        if !resp.success {
            return self.fail(&notify::failure(&resp, "Failed to sign out visitor"));
        }
        info!(id, "visitor signed out");
        self.term
            .notify(&Notification::success("Visitor signed out successfully"))?;
        self.dashboard(&FilterArgs::default())
    }

    fn delete(&mut self, id: VisitorId, confirmed: bool) -> Result<Outcome> {
        let confirmed = confirmed || (self.interactive && prompt::confirm(DELETE_QUESTION)?);
        if !confirmed {
            return self.fail(&[Notification::error("Deletion cancelled; pass --yes to confirm")]);
        }

        let resp = self.api.delete_visitor(id);
        if !resp.success {
            return self.fail(&notify::failure(&resp, "Failed to delete visitor"));
        }
        info!(id, "visitor deleted");
        self.term.notify(&Notification::success("Visitor deleted successfully"))?;
        self.dashboard(&FilterArgs::default())
    }
}
