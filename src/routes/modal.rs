use crate::{
    data::student::{StudentField, StudentRecord},
    error::{MissingStudentSnafu, RosterResult},
    import::ImportState,
    maud_conveniences::{form_submit_button, simple_form_element, subtitle},
    state::RosterState,
    view::{ViewEvent, ViewState},
};
use axum::{Form, extract::State};
use maud::{Markup, html};
use serde::Deserialize;
use snafu::OptionExt;

fn close_button() -> Markup {
    html! {
        button hx-post="/internal/view" hx-vals="{\"action\": \"close\"}" hx-target="#modal" class="absolute top-2 right-4 text-gray-400 hover:text-white text-xl" {"×"}
    }
}

fn student_fields(draft: &StudentRecord) -> Markup {
    html! {
        @for field in StudentField::ALL {
            @let ty = if field == StudentField::Email { "email" } else { "text" };
            (simple_form_element(field.name(), field.label(), true, Some(ty), Some(draft.get(field))))
        }
    }
}

/// The dialog for `view`, placed into `#modal`. Anything in `notice` is shown above it.
pub fn render_modal(view: &ViewState, progress: u8, notice: Option<Markup>) -> Markup {
    let body = match view {
        ViewState::Closed => {
            return html! {
                @if let Some(notice) = notice {
                    (notice)
                }
            };
        }
        ViewState::SelectingType => html! {
            (subtitle("Select Upload Type"))
            div class="flex flex-row space-x-4" {
                button hx-post="/internal/view" hx-vals="{\"action\": \"single\"}" hx-target="#modal" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {
                    "Add Single User"
                }
                button hx-post="/internal/view" hx-vals="{\"action\": \"csv\"}" hx-target="#modal" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {
                    "Upload CSV"
                }
            }
        },
        ViewState::AddingSingle { draft } => html! {
            (subtitle("Add New Member"))
            form hx-put="/internal/members" hx-target="#modal" class="p-4" {
                (student_fields(draft))
                (form_submit_button(Some("Add Member")))
            }
        },
        ViewState::EditingOne { original_id, draft } => html! {
            (subtitle("Edit Member"))
            form hx-post="/internal/members/edit" hx-target="#modal" class="p-4" {
                input type="hidden" name="original_id" value=(original_id);
                (student_fields(draft))
                (form_submit_button(Some("Save Member")))
            }
        },
        ViewState::UploadingCsv { file_name } => html! {
            (subtitle("Upload CSV File"))
            form hx-put="/internal/import" hx-target="#modal" hx-encoding="multipart/form-data" class="p-4" {
                label for="file" class="block text-sm font-medium text-gray-400 mb-2" {"Upload Students CSV"}
                input type="file" name="file" id="file" accept=".csv" class="block w-full text-sm text-gray-300 file:mr-4 file:py-2 file:px-4 file:rounded file:border-0 file:text-sm file:font-semibold file:bg-violet-50 file:text-violet-700 hover:file:bg-violet-100 mb-4";
                (form_submit_button(Some("Upload")))
            }
            //the progress target has to exist before the upload starts for the feed to land in it
            div class="mt-4" {
                @if let Some(file_name) = file_name {
                    h4 class="font-semibold" {"Uploaded File: " (file_name)}
                }
                div {"Upload Progress: " span sse-swap="progress" {(progress) "%"}}
            }
        },
    };

    html! {
        div class="relative rounded shadow-xl flex flex-col p-4 m-2 bg-gray-700" {
            (close_button())
            @if let Some(notice) = notice {
                (notice)
            }
            (body)
        }
    }
}

pub async fn internal_get_modal(State(state): State<RosterState>) -> Markup {
    let notice = (state.import_state() == ImportState::Uploading)
        .then(|| html! { p class="italic mb-2" {"An upload is in progress."} });
    render_modal(&state.view().await, state.progress().current(), notice)
}

#[derive(Deserialize)]
pub struct ViewEventForm {
    action: String,
    student_id: Option<String>,
}

pub async fn internal_post_view(
    State(state): State<RosterState>,
    Form(ViewEventForm { action, student_id }): Form<ViewEventForm>,
) -> RosterResult<Markup> {
    let event = match action.as_str() {
        "open" => ViewEvent::OpenMenu,
        "single" => ViewEvent::ChooseSingle,
        "csv" => ViewEvent::ChooseCsv,
        "edit" => {
            let student_id = student_id.unwrap_or_default();
            let record = state
                .find(&student_id)
                .await
                .context(MissingStudentSnafu { student_id })?;
            ViewEvent::BeginEdit(record)
        }
        _ => ViewEvent::Close,
    };

    let view = state.apply_view_event(event).await;
    Ok(render_modal(&view, state.progress().current(), None))
}
