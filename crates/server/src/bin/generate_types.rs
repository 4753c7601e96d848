use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        db::types::TaskStatus::decl(),
        db::types::TaskPriority::decl(),
        db::types::ProjectStatus::decl(),
        db::types::NotificationType::decl(),
        db::types::Attachment::decl(),
        db::models::TagRef::decl(),
        db::models::task::Task::decl(),
        db::models::task::TaskData::decl(),
        db::models::task::TaskFilter::decl(),
        db::models::note::Note::decl(),
        db::models::note::NoteData::decl(),
        db::models::note::NoteFilter::decl(),
        db::models::project::Project::decl(),
        db::models::project::CreateProject::decl(),
        db::models::project::ProjectFilter::decl(),
        db::models::tag::Tag::decl(),
        db::models::tag::CreateTag::decl(),
        db::models::notification::Notification::decl(),
        db::models::stats::DashboardStats::decl(),
        services::services::config::AccessControlMode::decl(),
        services::services::config::AccessControlConfig::decl(),
        services::services::config::NotificationConfig::decl(),
        services::services::config::StorageConfig::decl(),
        services::services::config::EditorConfig::decl(),
        services::services::config::Config::decl(),
        services::services::editor::EditorState::decl(),
        services::services::editor::SaveOutcome::<()>::decl(),
        services::services::listing::BatchDeleteRequest::decl(),
        services::services::listing::BatchDeleteResult::decl(),
        services::services::notification::Actor::decl(),
        services::services::notification_center::ToastView::decl(),
        services::services::notification_center::CenterSnapshot::decl(),
        tools::password::PasswordCriteria::decl(),
        tools::password::PasswordStrength::decl(),
        tools::word_counter::TextStats::decl(),
        tools::profitability::ProfitabilityInput::decl(),
        tools::profitability::ProfitabilityReport::decl(),
        utils::response::ApiResponse::<()>::decl(),
        server::routes::projects::ProjectForm::decl(),
        server::routes::notifications::NotificationView::decl(),
        server::routes::notifications::AuthEventRequest::decl(),
        server::routes::tools::TextInput::decl(),
        server::routes::tools::PasswordInput::decl(),
        server::routes::tools::ExpressionInput::decl(),
        server::routes::tools::CalculationResult::decl(),
        server::routes::tools::ExtractedEmails::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| {
            let trimmed = decl.trim_start();
            if trimmed.starts_with("export") {
                trimmed.to_string()
            } else {
                format!("export {trimmed}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `cargo run --bin generate_types`.\n// Do not edit manually.\n\n{body}\n"
    )
}

fn main() -> anyhow::Result<()> {
    let check_mode = env::args().any(|arg| arg == "--check");
    let out_path = env::var("ATELIER_TYPES_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("shared/types.ts"));

    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&out_path).unwrap_or_default();
        if current == generated {
            println!("{} is up to date.", out_path.display());
            return Ok(());
        }
        anyhow::bail!(
            "{} is out of date. Run `cargo run --bin generate_types`.",
            out_path.display()
        );
    }

    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out_path, generated)?;
    println!("Wrote {}", out_path.display());
    Ok(())
}
