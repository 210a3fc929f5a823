use shared_types::*;
use std::fs;
use std::path::PathBuf;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Contact types
    types.push(clean_type(ContactStatus::export_to_string()?));
    types.push(clean_type(Contact::export_to_string()?));
    types.push(clean_type(CreateContactRequest::export_to_string()?));
    types.push(clean_type(UpdateContactRequest::export_to_string()?));
    types.push(clean_type(ContactsResponse::export_to_string()?));

    // Duplicate scan types
    types.push(clean_type(GroupBy::export_to_string()?));
    types.push(clean_type(KeyKind::export_to_string()?));
    types.push(clean_type(ContactPreview::export_to_string()?));
    types.push(clean_type(DuplicateGroup::export_to_string()?));
    types.push(clean_type(DuplicatesResponse::export_to_string()?));

    // Merge types
    types.push(clean_type(MergePicks::export_to_string()?));
    types.push(clean_type(MergeRequest::export_to_string()?));
    types.push(clean_type(ContactUpdate::export_to_string()?));
    types.push(clean_type(MergeDryRunResponse::export_to_string()?));
    types.push(clean_type(MergeAppliedResponse::export_to_string()?));
    types.push(clean_type(ContactMergeRecord::export_to_string()?));
    types.push(clean_type(ContactMergesResponse::export_to_string()?));

    // Envelopes
    types.push(clean_type(FailureResponse::export_to_string()?));
    types.push(clean_type(ErrorResponse::export_to_string()?));

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("../gui/src/api-types"));
    fs::create_dir_all(&output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

/// All types land in one file, so per-type imports and generator banners go.
fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
