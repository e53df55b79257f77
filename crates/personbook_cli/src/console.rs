//! Interactive text menu over the person service.
//!
//! # Responsibility
//! - Read menu choices and field values line by line.
//! - Render service results and failures for a human operator.
//!
//! # Invariants
//! - A failed operation never ends the loop; only `0` or end of input does.
//! - Business rules live in the service; this module only parses and prints.

use log::error;
use personbook_core::{PersonId, PersonRepository, PersonService, ServiceError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};

#[derive(Debug)]
enum ConsoleError {
    Service(ServiceError),
    InvalidNumber(String),
    Io(io::Error),
}

impl Display for ConsoleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service(err) => write!(f, "{err}"),
            Self::InvalidNumber(value) => write!(f, "`{value}` is not a valid number"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConsoleError {}

impl From<ServiceError> for ConsoleError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<io::Error> for ConsoleError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Menu-driven console bound to one service instance.
pub struct Console<R: PersonRepository, I: BufRead, O: Write> {
    service: PersonService<R>,
    input: I,
    output: O,
    running: bool,
}

impl<R: PersonRepository, I: BufRead, O: Write> Console<R, I, O> {
    pub fn new(service: PersonService<R>, input: I, output: O) -> Self {
        Self {
            service,
            input,
            output,
            running: true,
        }
    }

    /// Runs the menu loop until the operator exits or input ends.
    ///
    /// # Errors
    /// - Returns I/O errors from the underlying reader or writer.
    pub fn run(&mut self) -> io::Result<()> {
        while self.running {
            self.print_menu()?;
            let Some(choice) = self.read_line()? else {
                break;
            };

            match self.process_choice(choice.trim()) {
                Ok(()) => {}
                Err(ConsoleError::Io(err)) => return Err(err),
                Err(err) => self.report(&err)?,
            }

            if self.running {
                writeln!(self.output, "\nPress Enter to continue...")?;
                if self.read_line()?.is_none() {
                    break;
                }
            }
        }
        Ok(())
    }

    fn report(&mut self, err: &ConsoleError) -> io::Result<()> {
        match err {
            ConsoleError::Service(ServiceError::Validation(inner)) => {
                writeln!(self.output, "Validation error: {inner}")
            }
            ConsoleError::InvalidNumber(_) => writeln!(self.output, "Validation error: {err}"),
            ConsoleError::Service(
                ServiceError::NotFound(_) | ServiceError::EmailAlreadyExists(_),
            ) => writeln!(self.output, "Error: {err}"),
            _ => {
                error!("event=console_op module=cli status=error error={err}");
                writeln!(self.output, "Unexpected error: {err}")
            }
        }
    }

    fn process_choice(&mut self, choice: &str) -> Result<(), ConsoleError> {
        match choice {
            "1" => self.create_person(),
            "2" => self.get_by_id(),
            "3" => self.list_all(),
            "4" => self.update_person(),
            "5" => self.delete_person(),
            "6" => self.get_by_email(),
            "0" => {
                self.running = false;
                writeln!(self.output, "Application closed!")?;
                Ok(())
            }
            _ => {
                writeln!(self.output, "Invalid choice. Please try again.")?;
                Ok(())
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "\n=== Person Management ===")?;
        writeln!(self.output, "1. Create Person")?;
        writeln!(self.output, "2. Find Person by ID")?;
        writeln!(self.output, "3. List All Persons")?;
        writeln!(self.output, "4. Update Person")?;
        writeln!(self.output, "5. Delete Person")?;
        writeln!(self.output, "6. Find Person by Email")?;
        writeln!(self.output, "0. Exit")?;
        write!(self.output, "Choose an option: ")?;
        self.output.flush()
    }

    fn create_person(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n--- Create New Person ---")?;
        let name = self.prompt("Enter name: ")?;
        let email = self.prompt("Enter email: ")?;
        let age = self.prompt_age("Enter age (optional, press Enter to skip): ")?;

        let person = self.service.create_person(&name, &email, age)?;
        writeln!(self.output, "Person created successfully!")?;
        writeln!(self.output, "Created: {person}")?;
        Ok(())
    }

    fn get_by_id(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n--- Find Person by ID ---")?;
        let id = self.prompt_id("Enter person ID: ")?;

        let person = self.service.get_by_id(id)?;
        writeln!(self.output, "Person found:")?;
        writeln!(self.output, "{person}")?;
        Ok(())
    }

    fn list_all(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n--- All Persons ---")?;
        let persons = self.service.list_all()?;

        if persons.is_empty() {
            writeln!(self.output, "No persons found.")?;
            return Ok(());
        }

        writeln!(self.output, "Total persons: {}", persons.len())?;
        for (index, person) in persons.iter().enumerate() {
            writeln!(self.output, "{}. {person}", index + 1)?;
        }
        Ok(())
    }

    fn update_person(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n--- Update Person ---")?;
        let id = self.prompt_id("Enter person ID to update: ")?;

        let current = self.service.get_by_id(id)?;
        writeln!(self.output, "Current data: {current}")?;

        let name = self.prompt("Enter new name: ")?;
        let email = self.prompt("Enter new email: ")?;
        let age = self.prompt_age("Enter new age (optional, press Enter to skip): ")?;

        let updated = self.service.update_person(id, &name, &email, age)?;
        writeln!(self.output, "Person updated successfully!")?;
        writeln!(self.output, "Updated: {updated}")?;
        Ok(())
    }

    fn delete_person(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n--- Delete Person ---")?;
        let id = self.prompt_id("Enter person ID to delete: ")?;

        let person = self.service.get_by_id(id)?;
        writeln!(self.output, "Person to delete: {person}")?;

        let confirmation = self.prompt("Are you sure? (yes/no): ")?;
        if confirmation.trim().eq_ignore_ascii_case("yes") {
            self.service.delete_person(id)?;
            writeln!(self.output, "Person deleted successfully!")?;
        } else {
            writeln!(self.output, "Deletion cancelled.")?;
        }
        Ok(())
    }

    fn get_by_email(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n--- Find Person by Email ---")?;
        let email = self.prompt("Enter email: ")?;

        let person = self.service.get_by_email(&email)?;
        writeln!(self.output, "Person found:")?;
        writeln!(self.output, "{person}")?;
        Ok(())
    }

    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}")?;
        self.output.flush()?;
        Ok(self.read_line()?.unwrap_or_default())
    }

    fn prompt_id(&mut self, label: &str) -> Result<PersonId, ConsoleError> {
        let raw = self.prompt(label)?;
        let trimmed = raw.trim();
        trimmed
            .parse::<PersonId>()
            .map_err(|_| ConsoleError::InvalidNumber(trimmed.to_string()))
    }

    fn prompt_age(&mut self, label: &str) -> Result<Option<i32>, ConsoleError> {
        let raw = self.prompt(label)?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ConsoleError::InvalidNumber(trimmed.to_string()))
    }

    /// Returns `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Console;
    use personbook_core::{Database, PersonService, SqlitePersonRepository};
    use std::io::Cursor;

    fn run_script(db: &Database, script: &str) -> String {
        let service = PersonService::new(SqlitePersonRepository::new(db));
        let mut output = Vec::new();
        Console::new(service, Cursor::new(script.to_string()), &mut output)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn create_then_list() {
        let db = Database::open_in_memory().unwrap();
        let output = run_script(&db, "1\nAnn\nann@x.com\n40\n\n3\n\n0\n");

        assert!(output.contains("Person created successfully!"));
        assert!(output.contains("Total persons: 1"));
        assert!(output.contains("ann@x.com"));
        assert!(output.contains("Application closed!"));
    }

    #[test]
    fn failures_are_reported_and_loop_continues() {
        let db = Database::open_in_memory().unwrap();
        let output = run_script(&db, "2\n99\n\n1\n\na@b.com\n\n\n2\nabc\n\n9\n\n0\n");

        assert!(output.contains("Error: Person not found with id: 99"));
        assert!(output.contains("Validation error: Name cannot be empty"));
        assert!(output.contains("Validation error: `abc` is not a valid number"));
        assert!(output.contains("Invalid choice. Please try again."));
        assert!(output.contains("Application closed!"));
    }

    #[test]
    fn duplicate_email_is_reported() {
        let db = Database::open_in_memory().unwrap();
        let output = run_script(&db, "1\nA\na@b.com\n\n\n1\nB\na@b.com\n\n\n0\n");

        assert!(output.contains("Error: Email already exists: a@b.com"));
    }

    #[test]
    fn update_then_find_by_email() {
        let db = Database::open_in_memory().unwrap();
        let output = run_script(
            &db,
            "1\nA\na@b.com\n\n\n4\n1\nA2\na2@b.com\n20\n\n6\na2@b.com\n\n0\n",
        );

        assert!(output.contains("Current data:"));
        assert!(output.contains("Person updated successfully!"));
        assert!(output.contains("name='A2'"));
        assert!(output.contains("age=20"));
    }

    #[test]
    fn delete_requires_confirmation() {
        let db = Database::open_in_memory().unwrap();
        let output = run_script(
            &db,
            "1\nA\na@b.com\n\n\n5\n1\nno\n\n5\n1\nYES\n\n3\n\n0\n",
        );

        assert!(output.contains("Deletion cancelled."));
        assert!(output.contains("Person deleted successfully!"));
        assert!(output.contains("No persons found."));
    }

    #[test]
    fn end_of_input_stops_the_loop() {
        let db = Database::open_in_memory().unwrap();
        let output = run_script(&db, "3\n");

        assert!(output.contains("No persons found."));
        assert!(!output.contains("Application closed!"));
    }
}
