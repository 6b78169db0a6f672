//! Notification preference commands.

use shelfmark_client::AppServices;

#[allow(clippy::print_stdout)]
pub fn show(services: &AppServices) {
    let settings = services.preferences().settings();
    println!("likes: {}", settings.likes);
    println!("promos: {}", settings.promos);
    println!("reminders: {}", settings.reminders);
    for (key, value) in &settings.extra {
        println!("{key}: {value}");
    }
}

pub fn set(services: &AppServices, key: &str, value: bool) {
    services.preferences().set(key, value);
    show(services);
}
