//! AquaMon - water quality monitoring for aquaculture farms
//!
//! Console front-end over the report session: photographed lab reports
//! go through AI extraction into an editable draft, saved reports build
//! the farm's history, and each viewed report is paired with a weather
//! forecast and an AI threat assessment.

use std::io::Write;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared::{evaluate_parameter, DayForecast, FarmingType, ParameterKey, WaterReport};

use aquamon_app::external::gemini::GeminiClient;
use aquamon_app::external::weather::WeatherClient;
use aquamon_app::session::{RegistrationForm, Session, View};
use aquamon_app::store::SessionStore;
use aquamon_app::threat::{self, ThreatSegment};
use aquamon_app::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aquamon=debug,aquamon_app=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting AquaMon");
    tracing::info!("Environment: {}", config.environment);

    let store = SessionStore::open(&config.storage.data_dir)?;
    let gemini = GeminiClient::new(&config.gemini);
    let weather = WeatherClient::new();
    let mut session = Session::new(store, &config.auth);

    println!("AquaMon - Water Quality Monitoring");
    println!("==================================");

    loop {
        session.recover();
        let quit = match session.view().clone() {
            View::Entry => entry_screen(&mut session).await?,
            View::OtpVerification { phone_number, .. } => {
                otp_screen(&mut session, &phone_number).await?
            }
            View::Registration { form } => registration_screen(&mut session, form)?,
            View::Dashboard => dashboard_screen(&mut session, &weather).await?,
            View::UploadReport { .. } => upload_screen(&mut session, &gemini).await?,
            View::EditAnalysis { .. } => edit_screen(&mut session)?,
            View::ViewAnalysis { .. } => report_screen(&mut session, &weather, &gemini).await?,
            View::PastReports => past_reports_screen(&mut session)?,
        };
        if quit {
            break;
        }
    }

    println!("Goodbye.");
    Ok(())
}

// ----------------------------------------------------------------------
// Screens; each returns true when the user asked to quit
// ----------------------------------------------------------------------

async fn entry_screen(session: &mut Session) -> anyhow::Result<bool> {
    println!();
    let Some(input) = read_line("Enter your 10-digit phone number (or 'quit'): ")? else {
        return Ok(true);
    };
    if input == "quit" {
        return Ok(true);
    }
    println!("Sending OTP...");
    if let Err(e) = session.send_otp(&input).await {
        println!("! {}", e);
    }
    Ok(false)
}

async fn otp_screen(session: &mut Session, phone_number: &str) -> anyhow::Result<bool> {
    println!();
    println!("An OTP was sent to {}.", phone_number);
    let Some(input) = read_line("Enter the OTP (or 'resend', 'back'): ")? else {
        return Ok(true);
    };
    match input.as_str() {
        "back" => session.back_to_entry(),
        "resend" => {
            let number = phone_number.to_string();
            println!("Resending OTP...");
            if let Err(e) = session.send_otp(&number).await {
                println!("! {}", e);
            }
        }
        code => {
            if let Err(e) = session.verify_otp(code) {
                println!("! {}", e);
            }
        }
    }
    Ok(false)
}

fn registration_screen(session: &mut Session, mut form: RegistrationForm) -> anyhow::Result<bool> {
    println!();
    println!("Welcome! Tell us about your farm ({}).", form.phone_number);
    let Some(name) = read_line("Your name: ")? else {
        return Ok(true);
    };
    let Some(location) = read_line("Farm location: ")? else {
        return Ok(true);
    };
    let choices = FarmingType::ALL
        .map(|t| t.as_str().to_ascii_lowercase())
        .join("/");
    let Some(farming_type) = read_line(&format!("Farming type ({}): ", choices))? else {
        return Ok(true);
    };
    let Some(size) = read_line("Farm size (e.g. '2 acres', '5 ponds'): ")? else {
        return Ok(true);
    };

    form.name = name;
    form.farm_location = location;
    form.farming_type = FarmingType::parse(&farming_type);
    form.farm_size = size;

    if let Err(e) = session.register(&form) {
        println!("! {}", e);
    }
    Ok(false)
}

async fn dashboard_screen(session: &mut Session, weather: &WeatherClient) -> anyhow::Result<bool> {
    if session.weather().is_empty() {
        session.refresh_weather(weather).await;
    }

    println!();
    if let Some(profile) = session.profile() {
        println!(
            "Dashboard - {} ({} farm, {}, {})",
            profile.name,
            profile.farming_type.as_str(),
            profile.farm_size,
            profile.farm_location
        );
    }
    render_weather(session.weather());
    match session.reports().first() {
        Some(latest) => println!(
            "Latest report: {} ({}, {})",
            latest.id,
            latest.status,
            latest.timestamp.format("%Y-%m-%d %H:%M UTC")
        ),
        None => println!("No reports yet. Upload your first water test report."),
    }

    let Some(input) = read_line("[upload | reports | view | logout | quit] > ")? else {
        return Ok(true);
    };
    match input.as_str() {
        "upload" => session.open_upload(),
        "reports" => session.open_past_reports(),
        "view" => {
            let latest_id = session.reports().first().map(|r| r.id.clone());
            match latest_id {
                Some(id) => {
                    if let Err(e) = session.view_report(&id) {
                        println!("! {}", e);
                    }
                }
                None => println!("! No reports to view"),
            }
        }
        "logout" => session.logout(),
        "quit" => return Ok(true),
        other => println!("! Unknown command: {}", other),
    }
    Ok(false)
}

async fn upload_screen(session: &mut Session, gemini: &GeminiClient) -> anyhow::Result<bool> {
    println!();
    println!("Upload a water test report photo.");
    let Some(input) = read_line("Image file path (or 'back'): ")? else {
        return Ok(true);
    };
    if input == "back" {
        session.open_dashboard();
        return Ok(false);
    }

    let bytes = match std::fs::read(&input) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("! Could not read {}: {}", input, e);
            return Ok(false);
        }
    };
    if let Err(e) = session.attach_image(&bytes, mime_for_path(&input)) {
        println!("! {}", e);
        return Ok(false);
    }

    println!("Analyzing report with AI, this can take a moment...");
    match session.analyze(gemini).await {
        Ok(()) => println!("Analysis complete. Review the extracted values below."),
        Err(e) => println!("! {}", e),
    }
    Ok(false)
}

fn edit_screen(session: &mut Session) -> anyhow::Result<bool> {
    println!();
    println!("Review extracted values (non-numeric input clears a value):");
    if let Some(draft) = session.current_report() {
        render_report(draft);
    }

    let Some(input) = read_line("[set <parameter> <value> | notes <text> | save | back] > ")?
    else {
        return Ok(true);
    };
    let mut parts = input.splitn(3, ' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("set"), Some(key), value) => match ParameterKey::from_json_key(key) {
            Some(key) => {
                if let Err(e) = session.set_parameter(key, value.unwrap_or("")) {
                    println!("! {}", e);
                }
            }
            None => println!("! Unknown parameter: {}", key),
        },
        (Some("notes"), text, rest) => {
            let notes = match (text, rest) {
                (Some(a), Some(b)) => format!("{} {}", a, b),
                (Some(a), None) => a.to_string(),
                _ => String::new(),
            };
            if let Err(e) = session.set_notes(&notes) {
                println!("! {}", e);
            }
        }
        (Some("save"), _, _) => {
            if let Err(e) = session.save_report() {
                println!("! {}", e);
            } else {
                println!("Report saved.");
            }
        }
        (Some("back"), _, _) => session.open_dashboard(),
        _ => println!("! Unknown command: {}", input),
    }
    Ok(false)
}

async fn report_screen(
    session: &mut Session,
    weather: &WeatherClient,
    gemini: &GeminiClient,
) -> anyhow::Result<bool> {
    session.refresh_weather(weather).await;
    if session.threat_narrative().is_none() && session.threat_error().is_none() {
        session.maybe_refresh_threat(gemini).await;
    }

    println!();
    match session.current_report() {
        Some(report) => {
            println!(
                "Report {} - {} ({})",
                report.id,
                report.status,
                report.timestamp.format("%Y-%m-%d %H:%M UTC")
            );
            render_report(report);
        }
        None => println!("! Report no longer exists"),
    }
    render_weather(session.weather());

    if let Some(narrative) = session.threat_narrative() {
        println!("AI Threat Assessment:");
        render_narrative(narrative);
    } else if let Some(error) = session.threat_error() {
        println!("Threat assessment unavailable: {}", error);
    }

    let Some(input) = read_line("[back | logout | quit] > ")? else {
        return Ok(true);
    };
    match input.as_str() {
        "back" => session.close_report(),
        "logout" => session.logout(),
        "quit" => return Ok(true),
        other => println!("! Unknown command: {}", other),
    }
    Ok(false)
}

fn past_reports_screen(session: &mut Session) -> anyhow::Result<bool> {
    println!();
    println!("Past reports (newest first):");
    if session.reports().is_empty() {
        println!("  (none)");
    }
    for (i, report) in session.reports().iter().enumerate() {
        println!(
            "  {}. {} - {} ({})",
            i + 1,
            report.timestamp.format("%Y-%m-%d %H:%M UTC"),
            report.status,
            report.id
        );
    }

    let Some(input) = read_line("[view <n> | dashboard | logout] > ")? else {
        return Ok(true);
    };
    let mut parts = input.splitn(2, ' ');
    match (parts.next(), parts.next()) {
        (Some("view"), Some(n)) => {
            let id = n
                .parse::<usize>()
                .ok()
                .and_then(|n| session.reports().get(n.wrapping_sub(1)))
                .map(|r| r.id.clone());
            match id {
                Some(id) => {
                    if let Err(e) = session.view_report(&id) {
                        println!("! {}", e);
                    }
                }
                None => println!("! No such report"),
            }
        }
        (Some("dashboard"), _) => session.open_dashboard(),
        (Some("logout"), _) => session.logout(),
        _ => println!("! Unknown command: {}", input),
    }
    Ok(false)
}

// ----------------------------------------------------------------------
// Rendering
// ----------------------------------------------------------------------

fn render_report(report: &WaterReport) {
    for key in ParameterKey::ALL {
        let value = report.parameters.get(key);
        let status = evaluate_parameter(key, value);
        let rendered = match value {
            Some(v) => format!("{} {}", v, key.unit()),
            None => "-".to_string(),
        };
        println!("  {:<28} {:<14} [{}]", key.label(), rendered, status);
    }
    if !report.suggestions.is_empty() {
        println!("  Suggestions:");
        for suggestion in &report.suggestions {
            println!("    - {}", suggestion);
        }
    }
    if let Some(notes) = &report.notes {
        println!("  Notes: {}", notes);
    }
}

fn render_weather(forecast: &[DayForecast]) {
    if forecast.is_empty() {
        return;
    }
    println!("Forecast:");
    for day in forecast {
        println!(
            "  {:<14} {:<14} {:.0}-{:.0}°C",
            day.date, day.condition, day.temp_min, day.temp_max
        );
    }
}

fn render_narrative(narrative: &str) {
    for segment in threat::segment_narrative(narrative) {
        match segment {
            ThreatSegment::Threat(text) => println!("  !! {}", text),
            ThreatSegment::Risk(text) => println!("  Risk: {}", text),
            ThreatSegment::Explanation(text) => println!("  {}", text),
            ThreatSegment::SuggestionsHeading => println!("  Suggestions:"),
            ThreatSegment::Suggestion(text) => println!("    - {}", text),
            ThreatSegment::Prose(text) => println!("  {}", text),
        }
    }
}

fn mime_for_path(path: &str) -> &'static str {
    match path.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Prompt and read one trimmed line; `None` on end of input.
fn read_line(prompt: &str) -> std::io::Result<Option<String>> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let mut buf = String::new();
    let read = std::io::stdin().read_line(&mut buf)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}
