use std::{fs, path::PathBuf};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        db::models::form_schema::FieldKind::decl(),
        db::models::form_schema::FieldDescriptor::decl(),
        db::models::form_schema::FormSchema::decl(),
        db::models::form::FormStatus::decl(),
        db::models::form::Form::decl(),
        db::models::form::CreateForm::decl(),
        db::models::form::UpdateForm::decl(),
        db::models::form_response::AnswerValue::decl(),
        db::models::form_response::AnswerMap::decl(),
        db::models::form_response::FormResponse::decl(),
        db::models::event::Event::decl(),
        db::models::event::CreateEvent::decl(),
        db::models::member::VisitorStatus::decl(),
        db::models::member::Member::decl(),
        db::models::attendance::AttendanceMethod::decl(),
        db::models::attendance::Attendance::decl(),
        services::services::form_renderer::InputType::decl(),
        services::services::form_renderer::Control::decl(),
        services::services::form_renderer::RenderedField::decl(),
        services::services::form_renderer::RenderedForm::decl(),
        services::services::forms::FormFilter::decl(),
        services::services::forms::ShareLink::decl(),
        services::services::submission::PublicFormView::decl(),
        services::services::response_aggregator::FrequencyBucket::decl(),
        services::services::response_aggregator::FieldFrequency::decl(),
        services::services::attendance::FieldIssue::decl(),
        services::services::attendance::CheckIn::decl(),
        services::services::attendance::CheckInReceipt::decl(),
        server::routes::health::HealthStatus::decl(),
        server::routes::forms::SetStatusRequest::decl(),
        server::routes::events::EventWithLink::decl(),
        server::routes::events::SetActiveRequest::decl(),
        utils::response::ApiResponse::<(), ()>::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|d| format!("export {}", d.trim_start_matches("export ")))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "// This file was generated by `generate_types`. Do not edit it by hand.\n\n{}\n",
        body
    )
}

fn main() {
    let check_mode = std::env::args().any(|arg| arg == "--check");
    let out_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let out_file = out_dir.join("types.ts");
    let generated = generate_types_content();

    if check_mode {
        let current = fs::read_to_string(&out_file).unwrap_or_default();
        if current == generated {
            println!("✅ shared/types.ts is up to date.");
            return;
        }
        eprintln!("❌ shared/types.ts is out of date. Run `cargo run --bin generate_types`.");
        std::process::exit(1);
    }

    fs::create_dir_all(&out_dir).expect("cannot create shared/");
    fs::write(&out_file, generated).expect("cannot write shared/types.ts");
    println!("✅ wrote {}", out_file.display());
}
