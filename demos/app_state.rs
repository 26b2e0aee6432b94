#![allow(dead_code)]

use sovran_state::{State, StateTable, Stateful, TableConfig, WrongState};
use std::sync::Arc;

/// Demonstrates attaching session state to short-lived connection objects
fn main() -> Result<(), WrongState> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // A private table keeps these connections out of the global one
    let table = StateTable::with_config(TableConfig { sweep_threshold: 8 });

    let server = Connection::new(1, "server.local");
    let sessions = SessionModule::new(&table);

    sessions.connect(&server);
    sessions.authenticate(&server, "alice".to_string())?;
    sessions.touch(&server)?;
    sessions.touch(&server)?;
    print_session(&table, &server);

    // Short-lived connections come and go; their entries are swept
    for id in 2..40 {
        let transient = Connection::new(id, "transient.local");
        sessions.connect(&transient);
    }
    println!("\nEntries after churn: {}", table.len());
    println!("Reclaimed by explicit sweep: {}", table.sweep());
    println!("Entries now: {}", table.len());

    // Guarded updates refuse to touch a connection in the wrong phase
    sessions.disconnect(&server);
    match sessions.touch(&server) {
        Ok(()) => println!("\nTouched a closed session?"),
        Err(e) => println!("\nCannot touch closed session: {}", e),
    }
    print_session(&table, &server);

    Ok(())
}

struct SessionModule<'a> {
    table: &'a StateTable,
}

impl<'a> SessionModule<'a> {
    fn new(table: &'a StateTable) -> Self {
        Self { table }
    }

    fn connect(&self, conn: &Arc<Connection>) {
        self.table.get_or_create(conn).set(Connecting);
    }

    fn authenticate(&self, conn: &Arc<Connection>, user: String) -> Result<(), WrongState> {
        let state = self.table.get_or_create(conn);
        // Only a connecting session may authenticate
        state.at::<Connecting>()?;
        state.set(Authenticated { user, requests: 0 });
        Ok(())
    }

    fn touch(&self, conn: &Arc<Connection>) -> Result<(), WrongState> {
        self.table
            .get_or_create(conn)
            .update(|session: &mut Authenticated| session.requests += 1)
    }

    fn disconnect(&self, conn: &Arc<Connection>) {
        self.table.get_or_create(conn).set(Closed);
    }
}

fn print_session(table: &StateTable, conn: &Arc<Connection>) {
    let state = table.get_or_create(conn);
    println!("\nSESSION {} ({}):", conn.id, conn.host);
    if let Ok(session) = state.at::<Authenticated>() {
        println!("user: {}, requests: {}", session.user, session.requests);
    } else {
        println!("state: {:?}", state.current_state());
    }
}

// Data structures

struct Connection {
    id: u64,
    host: String,
}

impl Connection {
    fn new(id: u64, host: &str) -> Arc<Self> {
        Arc::new(Self {
            id,
            host: host.to_string(),
        })
    }
}

impl Stateful for Connection {}

#[derive(Debug, Clone)]
struct Connecting;
impl State for Connecting {}

#[derive(Debug, Clone)]
struct Authenticated {
    user: String,
    requests: u32,
}
impl State for Authenticated {}

#[derive(Debug, Clone)]
struct Closed;
impl State for Closed {}
