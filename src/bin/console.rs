//! Interactive console talking to a remote user store.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use userbase::config::Telemetry;
use userbase::directory::{DEFAULT_PORT, DEFAULT_SERVICE_NAME};
use userbase::store::{
    self, DebugUserStore, UPDATE_KEY_ABILITY, UPDATE_KEY_EXPERIENCE, UserStore,
};
use userbase::user::User;
use userbase::{Error, telemetry};

const NOT_FOUND: &str = "The given e-mail is not in the database.";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host running the directory.
    host: String,
    /// Log entry and exit timestamps of every store call.
    #[clap(long)]
    debug: bool,
    /// Port of the directory.
    #[clap(long, default_value_t = DEFAULT_PORT)]
    directory_port: u16,
    /// Name the store is published under.
    #[clap(long, default_value = DEFAULT_SERVICE_NAME)]
    name: String,
}

/// Reasons ending a console session.
#[derive(Debug, Error)]
enum SessionError {
    #[error(transparent)]
    Store(#[from] Error),

    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("end of input")]
    Closed,
}

enum Flow {
    Continue,
    Quit,
}

struct Console<S, R, W> {
    store: S,
    input: R,
    output: W,
}

impl<S: UserStore, R: BufRead, W: Write> Console<S, R, W> {
    fn new(store: S, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Run the menu until the user quits or the input ends.
    ///
    /// A transport fault ends the session with an error.
    async fn run(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "========== USER DATABASE ==========")?;

        loop {
            match self.step().await {
                Ok(Flow::Continue) => writeln!(self.output)?,
                Ok(Flow::Quit) | Err(SessionError::Closed) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    async fn step(&mut self) -> Result<Flow, SessionError> {
        writeln!(self.output, "Type the number of the operation to run.")?;
        writeln!(self.output)?;
        writeln!(self.output, "1. Add user")?;
        writeln!(self.output, "2. List users by formation")?;
        writeln!(self.output, "3. List abilities of users by address")?;
        writeln!(self.output, "4. Add experience to a user")?;
        writeln!(self.output, "5. Show experience of a user")?;
        writeln!(self.output, "6. List every user")?;
        writeln!(self.output, "7. Show a user")?;
        writeln!(self.output, "8. Add ability to a user")?;
        writeln!(self.output, "0. Quit")?;
        writeln!(self.output)?;

        let operation = self.ask("Operation: ")?;
        writeln!(self.output)?;

        match operation.as_str() {
            "1" => self.add_user().await?,
            "2" => self.users_by_formation().await?,
            "3" => self.abilities_by_address().await?,
            "4" => self.append("Experience: ", UPDATE_KEY_EXPERIENCE).await?,
            "5" => self.show_experience().await?,
            "6" => self.show_all().await?,
            "7" => self.show_user().await?,
            "8" => self.append("Ability: ", UPDATE_KEY_ABILITY).await?,
            "0" => return Ok(Flow::Quit),
            _ => writeln!(self.output, "Invalid operation.")?,
        }

        Ok(Flow::Continue)
    }

    /// Print `question` and read one trimmed line.
    fn ask(&mut self, question: &str) -> Result<String, SessionError> {
        write!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SessionError::Closed);
        }
        Ok(line.trim().to_owned())
    }

    /// Report application errors, keep transport faults fatal.
    fn outcome<T>(&mut self, result: userbase::Result<T>) -> Result<Option<T>, SessionError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_transport() => Err(err.into()),
            Err(err) => {
                writeln!(self.output, "Operation failed: {err}.")?;
                Ok(None)
            },
        }
    }

    async fn find(&mut self, email: &str) -> Result<Option<User>, SessionError> {
        let users = self.store.read().await?;
        Ok(users.into_iter().find(|user| user.is(email)))
    }

    async fn add_user(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "1. Add user")?;
        let mut builder = User::builder();

        let email = self.ask("E-mail: ")?;
        if !email.is_empty() {
            builder = builder.email(email);
        }
        let name = self.ask("Name: ")?;
        if !name.is_empty() {
            builder = builder.name(name);
        }
        let address = self.ask("Address: ")?;
        if !address.is_empty() {
            builder = builder.address(address);
        }
        let formation = self.ask("Formation: ")?;
        if !formation.is_empty() {
            builder = builder.formation(formation);
        }

        loop {
            let path = self.ask("Profile picture path [ENTER for none]: ")?;
            if path.is_empty() {
                break;
            }
            match std::fs::read(&path) {
                Ok(data) => {
                    builder = builder.picture_data(data);
                    break;
                },
                Err(_) => writeln!(self.output, "Could not read the file.")?,
            }
        }

        let abilities = self.ask("Abilities [separated by ';', ENTER for none]: ")?;
        builder = builder.abilities(split(&abilities));
        let experience = self.ask("Experience [separated by ';', ENTER for none]: ")?;
        builder = builder.experience(split(&experience));

        let user = match builder.build() {
            Ok(user) => user,
            Err(errors) => {
                writeln!(self.output, "Invalid user: {errors}")?;
                return Ok(());
            },
        };

        if self.store.create(user).await? {
            writeln!(self.output, "User added.")?;
        } else {
            writeln!(self.output, "A user with this e-mail already exists.")?;
        }
        Ok(())
    }

    async fn users_by_formation(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "2. List users by formation")?;
        let formation = self.ask("Formation: ")?;

        let users = self.store.read().await?;
        writeln!(self.output, "Users:")?;
        for user in users
            .iter()
            .filter(|user| user.formation().to_lowercase() == formation.to_lowercase())
        {
            writeln!(self.output, "{}", user.email())?;
        }
        Ok(())
    }

    async fn abilities_by_address(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "3. List abilities of users by address")?;
        let address = self.ask("Address: ")?;

        let users = self.store.read().await?;
        writeln!(self.output, "Abilities:")?;
        for user in users
            .iter()
            .filter(|user| user.address().to_lowercase() == address.to_lowercase())
        {
            writeln!(self.output, "{:?}", user.abilities())?;
        }
        Ok(())
    }

    async fn append(&mut self, question: &str, key: &str) -> Result<(), SessionError> {
        let email = self.ask("E-mail: ")?;
        let value = self.ask(question)?;

        let result = self.store.update(&email, key, &value).await;
        match self.outcome(result)? {
            Some(true) => writeln!(self.output, "Profile updated.")?,
            Some(false) => writeln!(self.output, "{NOT_FOUND}")?,
            None => {},
        }
        Ok(())
    }

    async fn show_experience(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "5. Show experience of a user")?;
        let email = self.ask("E-mail: ")?;

        match self.find(&email).await? {
            Some(user) => writeln!(self.output, "Experience: {:?}", user.experience())?,
            None => writeln!(self.output, "{NOT_FOUND}")?,
        }
        Ok(())
    }

    async fn show_all(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "6. List every user")?;

        for user in self.store.read().await? {
            writeln!(self.output)?;
            self.show(&user)?;
        }
        Ok(())
    }

    async fn show_user(&mut self) -> Result<(), SessionError> {
        writeln!(self.output, "7. Show a user")?;
        let email = self.ask("E-mail: ")?;

        match self.find(&email).await? {
            Some(user) => self.show(&user)?,
            None => writeln!(self.output, "{NOT_FOUND}")?,
        }
        Ok(())
    }

    fn show(&mut self, user: &User) -> io::Result<()> {
        writeln!(self.output, "Name: {}", user.name())?;
        writeln!(self.output, "E-mail: {}", user.email())?;
        writeln!(self.output, "Address: {}", user.address())?;
        writeln!(self.output, "Formation: {}", user.formation())?;
        writeln!(
            self.output,
            "Has picture? {}",
            if user.has_picture() { "Yes" } else { "No" }
        )?;
        writeln!(self.output, "Abilities: {:?}", user.abilities())?;
        writeln!(self.output, "Experience: {:?}", user.experience())
    }
}

fn split(answer: &str) -> Vec<String> {
    answer
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::setup_logging(
        &Telemetry::default(),
        if args.debug {
            "warn,userbase::debug=info"
        } else {
            "warn"
        },
    );

    let remote = match store::connect(&args.host, args.directory_port, &args.name).await {
        Ok(remote) => remote,
        Err(err) => {
            eprintln!("Cannot locate `{}` on {}: {err}", args.name, args.host);
            return ExitCode::FAILURE;
        },
    };
    let store: Box<dyn UserStore> = if args.debug {
        Box::new(DebugUserStore::new(remote))
    } else {
        Box::new(remote)
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(store, stdin.lock(), stdout.lock());

    match console.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Session aborted: {err}");
            ExitCode::FAILURE
        },
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use userbase::error::TransportError;
    use userbase::store::MemoryUserStore;

    use super::*;

    async fn session<S: UserStore>(store: S, script: &str) -> (Result<(), SessionError>, String) {
        let mut output = Vec::new();
        let result = Console::new(store, script.as_bytes(), &mut output).run().await;
        (result, String::from_utf8(output).unwrap())
    }

    struct Disconnected;

    #[async_trait]
    impl UserStore for Disconnected {
        async fn create(&self, _user: User) -> userbase::Result<bool> {
            Err(disconnected())
        }

        async fn read(&self) -> userbase::Result<Vec<User>> {
            Err(disconnected())
        }

        async fn update(&self, _: &str, _: &str, _: &str) -> userbase::Result<bool> {
            Err(disconnected())
        }
    }

    fn disconnected() -> Error {
        TransportError::Status {
            status: 502,
            detail: "peer went away".into(),
        }
        .into()
    }

    #[test]
    fn test_split() {
        assert_eq!(split(" IoT ; Cloud;;"), ["IoT", "Cloud"]);
        assert!(split("").is_empty());
    }

    #[tokio::test]
    async fn test_add_then_show() {
        let script = "1\na@x.com\nAna\nR1\nCS\n\nIoT; Cloud\n\n\
                      4\nA@X.COM\nIntern at Y\n\
                      7\na@x.com\n0\n";
        let (result, output) = session(MemoryUserStore::new(), script).await;

        assert!(result.is_ok());
        assert!(output.contains("User added."));
        assert!(output.contains("Profile updated."));
        assert!(output.contains("Name: Ana"));
        assert!(output.contains("Has picture? No"));
        assert!(output.contains(r#"Abilities: ["IoT", "Cloud"]"#));
        assert!(output.contains(r#"Experience: ["Intern at Y"]"#));
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_fields() {
        let script = "1\na@x.com\nAna\nR1\nCS\n\n\n\n\
                      1\nA@x.com\nBob\nR2\nLaw\n\n\n\n\
                      1\nb@x.com\n\nR2\nLaw\n\n\n\n";
        let (result, output) = session(MemoryUserStore::new(), script).await;

        // end of input quits.
        assert!(result.is_ok());
        assert!(output.contains("A user with this e-mail already exists."));
        assert!(output.contains("Invalid user"));
        assert!(output.contains("name"));
    }

    #[tokio::test]
    async fn test_unreadable_picture_is_asked_again() {
        let script = "1\na@x.com\nAna\nR1\nCS\n/does/not/exist.png\n\n\n\n0\n";
        let (result, output) = session(MemoryUserStore::new(), script).await;

        assert!(result.is_ok());
        assert!(output.contains("Could not read the file."));
        assert!(output.contains("User added."));
    }

    #[tokio::test]
    async fn test_queries() {
        let store = MemoryUserStore::new();
        for (email, address, formation) in [
            ("a@x.com", "R1", "CS"),
            ("b@x.com", "R1", "Law"),
            ("c@x.com", "R2", "cs"),
        ] {
            let user = User::builder()
                .email(email)
                .name("N")
                .address(address)
                .formation(formation)
                .abilities([email])
                .build()
                .unwrap();
            store.create(user).await.unwrap();
        }

        let (_, output) = session(store, "2\ncs\n3\nr1\n0\n").await;
        assert!(output.contains("a@x.com\n"));
        assert!(output.contains("c@x.com\n"));
        assert!(!output.contains("b@x.com\n"));
        assert!(output.contains(r#"["a@x.com"]"#));
        assert!(output.contains(r#"["b@x.com"]"#));
        assert!(!output.contains(r#"["c@x.com"]"#));
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let (_, output) = session(MemoryUserStore::new(), "8\nz@x.com\nIoT\n5\nz@x.com\n0\n").await;
        assert_eq!(output.matches(NOT_FOUND).count(), 2);
    }

    #[tokio::test]
    async fn test_transport_fault_aborts_session() {
        let (result, output) = session(Disconnected, "6\n7\na@x.com\n0\n").await;

        match result {
            Err(SessionError::Store(err)) => assert!(err.is_transport()),
            other => panic!("unexpected session end: {other:?}"),
        }
        assert_eq!(output.matches("Operation: ").count(), 1);
    }
}
