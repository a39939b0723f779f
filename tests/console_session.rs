use std::io::Cursor;

use clinic_scheduler::{Clinic, Console, CsvStore, Role};
use tempfile::tempdir;

fn clinic_with_drdoom() -> Clinic {
    let mut clinic = Clinic::default();
    clinic.bootstrap("admin123");
    clinic.register_account("drdoom", "pw", Role::Doctor).unwrap();
    clinic
}

fn run_script(clinic: Clinic, script: &str, store: Option<CsvStore>) -> (Clinic, String) {
    let mut console = Console::new(Cursor::new(script.to_string()), Vec::new(), clinic);
    if let Some(store) = store {
        console = console.with_store(store);
    }
    console.run().expect("console io");
    let (clinic, out) = console.into_parts();
    (clinic, String::from_utf8(out).expect("utf8 output"))
}

#[test]
fn register_book_cancel_then_view_is_empty() {
    let script = [
        "1", "bob", "secret", "",      // register
        "2", "bob", "secret", "",      // login
        "1", "drdoom", "2025-05-01", "09:00", "first visit", "", // create reservation
        "3", "1", "",                  // cancel #1
        "2", "",                       // view
        "0",                           // logout
        "0",                           // exit
    ]
    .join("\n")
        + "\n";

    let (clinic, out) = run_script(clinic_with_drdoom(), &script, None);

    assert!(out.contains("Registration successful!"));
    assert!(out.contains("Login successful as CLIENT."));
    assert!(out.contains("Reservation created successfully!"));
    assert!(out.contains("Reservation cancelled."));
    let view = out.rsplit("=== Your Reservations ===").next().unwrap();
    assert!(view.starts_with("\nNo reservations found."));
    assert!(out.trim_end().ends_with("Goodbye!"));
    assert!(clinic.reservations("bob").unwrap().is_empty());
}

#[test]
fn unavailable_doctor_is_refused_before_date_prompt() {
    let mut clinic = clinic_with_drdoom();
    clinic.register_client("bob", "pw").unwrap();
    clinic.toggle_availability("drdoom").unwrap();

    let script = "2\nbob\npw\n\n1\ndrdoom\n\n0\n0\n";
    let (clinic, out) = run_script(clinic, script, None);
    assert!(out.contains("Doctor 'drdoom' is currently unavailable"));
    assert!(!out.contains("Enter date"));
    assert!(clinic.reservations("bob").unwrap().is_empty());
}

#[test]
fn doctor_sees_patients_in_date_order() {
    let mut clinic = clinic_with_drdoom();
    clinic.register_client("bob", "pw").unwrap();
    clinic.register_client("alice", "pw").unwrap();
    clinic.book("bob", "drdoom", "2025-03-01", "09:00", "later").unwrap();
    clinic.book("alice", "drdoom", "2025-01-15", "10:00", "sooner").unwrap();

    let script = "2\ndrdoom\npw\n\n1\n\n2\n\n0\n0\n";
    let (clinic, out) = run_script(clinic, script, None);

    let alice = out.find("Patient: alice").expect("alice listed");
    let bob = out.find("Patient: bob").expect("bob listed");
    assert!(alice < bob);
    assert!(out.contains("You are now unavailable."));
    assert!(!clinic.directory().find("drdoom").unwrap().available);
}

#[test]
fn ambiguous_rating_asks_which_doctor() {
    let mut clinic = clinic_with_drdoom();
    clinic.register_account("drwho", "pw", Role::Doctor).unwrap();
    clinic.register_client("bob", "pw").unwrap();

    // "dr" matches drdoom and drwho; pick #2
    let script = "2\nbob\npw\n\n6\ndr\n2\n4\n\n0\n0\n";
    let (clinic, out) = run_script(clinic, script, None);

    assert!(out.contains("Several doctors match:"));
    assert!(out.contains("Thank you! You rated drwho with 4."));
    let drwho = clinic.directory().find("drwho").unwrap();
    assert_eq!((drwho.rating_total, drwho.rating_count), (4, 1));
}

#[test]
fn admin_deletes_user_report_and_summary_follow() {
    let dir = tempdir().expect("temp dir");
    let store = CsvStore::new(dir.path());

    let mut clinic = clinic_with_drdoom();
    clinic.register_client("bob", "pw").unwrap();
    clinic.register_client("carol", "pw").unwrap();
    clinic.book("bob", "drdoom", "2025-03-01", "09:00", "").unwrap();
    clinic.book("carol", "drdoom", "2025-01-01", "09:00", "").unwrap();
    for account in clinic.accounts() {
        store.account_registered(account).unwrap();
    }
    store.reservations_changed(&clinic).unwrap();

    let script = [
        "2", "admin", "admin123", "",
        "2", "admin", "",     // refuse self-delete
        "2", "drdoom", "",    // delete the doctor
        "3", "",              // report
        "4", "",              // rating summary
        "0", "0",
    ]
    .join("\n")
        + "\n";
    let (clinic, out) = run_script(clinic, &script, Some(store.clone()));

    assert!(out.contains("You cannot delete the account you are logged in with."));
    assert!(out.contains("User 'drdoom' has been deleted."));
    assert!(out.contains("Total reservations: 2"));
    let carol = out.find("Patient: carol").unwrap();
    let bob = out.find("Patient: bob").unwrap();
    assert!(carol < bob);
    assert!(out.contains("drdoom: doctor not found in system"));
    assert!(out.contains("dokterdoom: no ratings"));

    let mut reloaded = Clinic::default();
    store.load_into(&mut reloaded).unwrap();
    assert!(reloaded.directory().find("drdoom").is_none());
    assert_eq!(reloaded.directory().len(), clinic.directory().len());
}

#[test]
fn end_of_input_exits_cleanly() {
    let (_, out) = run_script(clinic_with_drdoom(), "2\nbob", None);
    assert!(out.contains("Username: "));
}
