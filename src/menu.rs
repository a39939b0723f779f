use std::io::{self, BufRead, Write};

use tracing::error;

use crate::clinic::{Clinic, Session};
use crate::directory::Role;
use crate::display::{
    format_doctor_list, format_numbered, format_rating_summary, format_report, format_schedule,
    format_users, NO_RESERVATIONS,
};
use crate::error::{ClinicError, StoreError};
use crate::store::CsvStore;

enum Flow {
    Continue,
    Logout,
    Exit,
}

/// Text-menu session over any line source and sink
pub struct Console<R, W> {
    input: R,
    out: W,
    clinic: Clinic,
    store: Option<CsvStore>,
    clear_screen: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W, clinic: Clinic) -> Self {
        Self {
            input,
            out,
            clinic,
            store: None,
            clear_screen: false,
        }
    }

    /// Persist every mutation through `store`
    pub fn with_store(mut self, store: CsvStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_screen_clearing(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn clinic(&self) -> &Clinic {
        &self.clinic
    }

    pub fn into_parts(self) -> (Clinic, W) {
        (self.clinic, self.out)
    }

    /// Runs the main menu until the user exits or input ends
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.clear()?;
            writeln!(self.out, "=== Clinic System ===")?;
            writeln!(self.out, "1. Register (Client)")?;
            writeln!(self.out, "2. Login")?;
            writeln!(self.out, "0. Exit")?;
            let Some(choice) = self.read_choice("Choose: ")? else {
                return Ok(());
            };
            let flow = match choice {
                1 => self.register()?,
                2 => self.login()?,
                0 => {
                    writeln!(self.out, "Goodbye!")?;
                    return Ok(());
                }
                _ => {
                    writeln!(self.out, "Invalid choice.")?;
                    self.pause()?
                }
            };
            if let Flow::Exit = flow {
                return Ok(());
            }
        }
    }

    fn clear(&mut self) -> io::Result<()> {
        if self.clear_screen {
            write!(self.out, "\x1B[2J\x1B[H")?;
        }
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Unparseable input reads as -1 so the menus fall through to "invalid"
    fn read_choice(&mut self, label: &str) -> io::Result<Option<i64>> {
        Ok(self
            .prompt(label)?
            .map(|s| s.trim().parse().unwrap_or(-1)))
    }

    fn pause(&mut self) -> io::Result<Flow> {
        match self.prompt("Press Enter to continue...")? {
            Some(_) => Ok(Flow::Continue),
            None => Ok(Flow::Exit),
        }
    }

    fn report_error(&mut self, err: &ClinicError) -> io::Result<()> {
        writeln!(self.out, "{}", err)
    }

    fn persist<F>(&mut self, save: F) -> io::Result<()>
    where
        F: FnOnce(&CsvStore, &Clinic) -> Result<(), StoreError>,
    {
        if let Some(store) = &self.store {
            if let Err(e) = save(store, &self.clinic) {
                error!(error = %e, "failed to save clinic data");
                writeln!(self.out, "Warning: changes could not be saved ({})", e)?;
            }
        }
        Ok(())
    }

    fn register(&mut self) -> io::Result<Flow> {
        writeln!(self.out, "=== Client Registration ===")?;
        let Some(username) = self.prompt("Choose username: ")? else {
            return Ok(Flow::Exit);
        };
        if self
            .clinic
            .directory()
            .find(&username.trim().to_lowercase())
            .is_some()
        {
            writeln!(self.out, "Username already exists.")?;
            return self.pause();
        }
        let Some(password) = self.prompt("Choose password: ")? else {
            return Ok(Flow::Exit);
        };

        match self.clinic.register_client(&username, &password) {
            Ok(identifier) => {
                self.persist(|store, clinic| match clinic.directory().find(&identifier) {
                    Some(account) => store.account_registered(account),
                    None => Ok(()),
                })?;
                writeln!(self.out, "Registration successful!")?;
            }
            Err(ClinicError::DuplicateIdentifier(_)) => writeln!(self.out, "Username already exists.")?,
            Err(e) => self.report_error(&e)?,
        }
        self.pause()
    }

    fn login(&mut self) -> io::Result<Flow> {
        let Some(username) = self.prompt("Username: ")? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.prompt("Password: ")? else {
            return Ok(Flow::Exit);
        };

        let session = match self.clinic.login(&username, &password) {
            Ok(session) => session,
            Err(_) => {
                writeln!(self.out, "Invalid username or password.")?;
                return self.pause();
            }
        };

        let label = match session.role {
            Role::Administrator => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Client => "CLIENT",
        };
        writeln!(self.out, "Login successful as {}.", label)?;
        if let Flow::Exit = self.pause()? {
            return Ok(Flow::Exit);
        }

        loop {
            let flow = match session.role {
                Role::Administrator => self.admin_menu(&session)?,
                Role::Doctor => self.doctor_menu(&session)?,
                Role::Client => self.client_menu(&session)?,
            };
            match flow {
                Flow::Continue => continue,
                Flow::Logout => return Ok(Flow::Continue),
                Flow::Exit => return Ok(Flow::Exit),
            }
        }
    }

    fn client_menu(&mut self, session: &Session) -> io::Result<Flow> {
        self.clear()?;
        writeln!(self.out, "=== CLIENT MENU (User: {}) ===", session.identifier)?;
        writeln!(self.out, "1. Create Reservation")?;
        writeln!(self.out, "2. View My Reservations")?;
        writeln!(self.out, "3. Cancel Reservation")?;
        writeln!(self.out, "4. View Doctors List")?;
        writeln!(self.out, "5. Search Doctors")?;
        writeln!(self.out, "6. Rate Doctor")?;
        writeln!(self.out, "0. Logout")?;
        let Some(choice) = self.read_choice("Choice: ")? else {
            return Ok(Flow::Exit);
        };
        let flow = match choice {
            0 => return Ok(Flow::Logout),
            1 => self.create_reservation(session)?,
            2 => {
                writeln!(self.out, "=== Your Reservations ===")?;
                let text = match self.clinic.personal_schedule(&session.identifier) {
                    Ok(view) => format_schedule(view.inorder(false)),
                    Err(e) => e.to_string() + "\n",
                };
                write!(self.out, "{}", text)?;
                Flow::Continue
            }
            3 => self.cancel_reservation(session)?,
            4 => {
                writeln!(self.out, "=== Doctors ===")?;
                let text = format_doctor_list(&self.clinic.list_doctors());
                write!(self.out, "{}", text)?;
                Flow::Continue
            }
            5 => self.search_doctors()?,
            6 => self.rate_doctor()?,
            _ => {
                writeln!(self.out, "Invalid choice.")?;
                Flow::Continue
            }
        };
        match flow {
            Flow::Exit => Ok(Flow::Exit),
            _ => self.pause(),
        }
    }

    fn create_reservation(&mut self, session: &Session) -> io::Result<Flow> {
        let Some(doctor) = self.prompt("Enter doctor's name: ")? else {
            return Ok(Flow::Exit);
        };
        // fail fast before asking for the rest
        if let Err(e) = self.clinic.bookable_doctor(&doctor) {
            self.report_error(&e)?;
            return Ok(Flow::Continue);
        }
        let Some(date) = self.prompt("Enter date (YYYY-MM-DD): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(time) = self.prompt("Enter time (HH:MM): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(notes) = self.prompt("Enter notes: ")? else {
            return Ok(Flow::Exit);
        };

        match self.clinic.book(&session.identifier, &doctor, &date, &time, &notes) {
            Ok(_) => {
                self.persist(|store, clinic| store.reservations_changed(clinic))?;
                writeln!(self.out, "Reservation created successfully!")?;
            }
            Err(e) => self.report_error(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn cancel_reservation(&mut self, session: &Session) -> io::Result<Flow> {
        let text = match self.clinic.reservations(&session.identifier) {
            Ok(queue) if queue.is_empty() => {
                writeln!(self.out, "{}", NO_RESERVATIONS)?;
                return Ok(Flow::Continue);
            }
            Ok(queue) => format_numbered(queue),
            Err(e) => {
                self.report_error(&e)?;
                return Ok(Flow::Continue);
            }
        };
        write!(self.out, "{}", text)?;

        let Some(choice) = self.read_choice("Reservation # to cancel: ")? else {
            return Ok(Flow::Exit);
        };
        let position = usize::try_from(choice).unwrap_or(0);
        match self.clinic.cancel(&session.identifier, position) {
            Ok(_) => {
                self.persist(|store, clinic| store.reservations_changed(clinic))?;
                writeln!(self.out, "Reservation cancelled.")?;
            }
            Err(e) => self.report_error(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn search_doctors(&mut self) -> io::Result<Flow> {
        let Some(prefix) = self.prompt("Doctor name starts with: ")? else {
            return Ok(Flow::Exit);
        };
        let text = format_doctor_list(&self.clinic.search_doctors(&prefix.to_lowercase()));
        write!(self.out, "{}", text)?;
        Ok(Flow::Continue)
    }

    fn rate_doctor(&mut self) -> io::Result<Flow> {
        let Some(mut query) = self.prompt("Enter doctor's name: ")? else {
            return Ok(Flow::Exit);
        };
        match self.clinic.resolve_doctor(&query) {
            Ok(_) => {}
            Err(ClinicError::AmbiguousDoctor(candidates)) => {
                writeln!(self.out, "Several doctors match:")?;
                for (i, candidate) in candidates.iter().enumerate() {
                    writeln!(self.out, "{}. {}", i + 1, candidate)?;
                }
                let Some(pick) = self.read_choice("Choose doctor #: ")? else {
                    return Ok(Flow::Exit);
                };
                match usize::try_from(pick).ok().and_then(|p| p.checked_sub(1)).and_then(|i| candidates.get(i)) {
                    Some(chosen) => query = chosen.clone(),
                    None => {
                        writeln!(self.out, "Invalid choice.")?;
                        return Ok(Flow::Continue);
                    }
                }
            }
            Err(e) => {
                self.report_error(&e)?;
                return Ok(Flow::Continue);
            }
        }

        let Some(raw) = self.prompt("Rating (1-5): ")? else {
            return Ok(Flow::Exit);
        };
        let Ok(rating) = raw.trim().parse::<i64>() else {
            writeln!(self.out, "Rating must be a number.")?;
            return Ok(Flow::Continue);
        };
        match self.clinic.rate_doctor(&query, rating) {
            Ok(doctor) => {
                // validated above, fits in u8
                let stored = rating as u8;
                self.persist(|store, _| store.rating_recorded(&doctor, stored))?;
                writeln!(self.out, "Thank you! You rated {} with {}.", doctor, rating)?;
            }
            Err(e) => self.report_error(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn doctor_menu(&mut self, session: &Session) -> io::Result<Flow> {
        self.clear()?;
        writeln!(self.out, "=== DOCTOR MENU (User: {}) ===", session.identifier)?;
        writeln!(self.out, "1. View My Appointments")?;
        writeln!(self.out, "2. Toggle Availability")?;
        writeln!(self.out, "0. Logout")?;
        let Some(choice) = self.read_choice("Choice: ")? else {
            return Ok(Flow::Exit);
        };
        match choice {
            0 => return Ok(Flow::Logout),
            1 => {
                writeln!(self.out, "=== Doctor's Appointments ===")?;
                let text = match self.clinic.doctor_schedule(&session.identifier) {
                    Ok(view) => format_schedule(view.inorder(true)),
                    Err(e) => e.to_string() + "\n",
                };
                write!(self.out, "{}", text)?;
            }
            2 => match self.clinic.toggle_availability(&session.identifier) {
                Ok(true) => writeln!(self.out, "You are now available.")?,
                Ok(false) => writeln!(self.out, "You are now unavailable.")?,
                Err(e) => self.report_error(&e)?,
            },
            _ => writeln!(self.out, "Invalid choice.")?,
        }
        self.pause()
    }

    fn admin_menu(&mut self, session: &Session) -> io::Result<Flow> {
        self.clear()?;
        writeln!(self.out, "=== ADMIN MENU ===")?;
        writeln!(self.out, "1. View Users")?;
        writeln!(self.out, "2. Delete User")?;
        writeln!(self.out, "3. Generate Report")?;
        writeln!(self.out, "4. Rating Summary")?;
        writeln!(self.out, "0. Logout")?;
        let Some(choice) = self.read_choice("Choice: ")? else {
            return Ok(Flow::Exit);
        };
        match choice {
            0 => return Ok(Flow::Logout),
            1 => {
                writeln!(self.out, "=== List of Users ===")?;
                let text = format_users(self.clinic.accounts());
                write!(self.out, "{}", text)?;
            }
            2 => {
                let Some(target) = self.prompt("Enter username to delete: ")? else {
                    return Ok(Flow::Exit);
                };
                if target.trim().eq_ignore_ascii_case(&session.identifier) {
                    writeln!(self.out, "You cannot delete the account you are logged in with.")?;
                } else {
                    match self.clinic.delete_account(&target) {
                        Ok(account) => {
                            self.persist(|store, clinic| {
                                store.accounts_changed(clinic)?;
                                store.reservations_changed(clinic)
                            })?;
                            writeln!(self.out, "User '{}' has been deleted.", account.identifier)?;
                        }
                        Err(e) => self.report_error(&e)?,
                    }
                }
            }
            3 => {
                writeln!(self.out, "=== Reservation Report ===")?;
                let text = match self.clinic.report() {
                    Ok(report) => format_report(&report),
                    Err(e) => e.to_string() + "\n",
                };
                write!(self.out, "{}", text)?;
            }
            4 => {
                writeln!(self.out, "=== Rating Summary ===")?;
                let text = format_rating_summary(&self.clinic.list_doctors());
                write!(self.out, "{}", text)?;
            }
            _ => writeln!(self.out, "Invalid choice.")?,
        }
        self.pause()
    }
}
