use crate::{
    data::student::StudentRecord,
    maud_conveniences::{render_table, title},
    state::RosterState,
};
use axum::{extract::State, response::IntoResponse};
use maud::{Markup, html};

const EMPTY_ROSTER: &str = "You haven't added anyone to your course yet. Add students or other instructors to your course.";

pub async fn get_index_route(State(state): State<RosterState>) -> impl IntoResponse {
    state.render(html! {
        div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full flex flex-col space-y-4" sse-connect="/sse_feed" {
            (title("List of Members"))

            div id="roster" hx-get="/internal/roster" hx-trigger="load, sse:roster" {}

            div class="flex flex-row space-x-4" {
                button hx-post="/internal/view" hx-vals="{\"action\": \"open\"}" hx-target="#modal" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded" {
                    "Add Member"
                }
                button hx-post="/internal/refresh" hx-target="#roster" class="bg-slate-600 hover:bg-slate-800 font-bold py-2 px-4 rounded" {
                    "Refresh"
                }
            }

            div id="modal" hx-get="/internal/modal" hx-trigger="load" {}
        }
    })
}

fn render_row(record: &StudentRecord) -> [Markup; 4] {
    //hx-vals wants JSON, and the record's own serialisation is exactly the delete query
    let as_json = serde_json::to_string(record).unwrap_or_default();
    let edit_vals = serde_json::json!({"action": "edit", "student_id": record.student_id}).to_string();

    [
        html! {(record.student_id)},
        html! {(record.full_name())},
        html! {(record.email)},
        html! {
            div class="flex flex-row space-x-2 justify-center" {
                button hx-post="/internal/view" hx-vals=(edit_vals) hx-target="#modal" class="bg-slate-600 hover:bg-slate-800 py-1 px-3 rounded" {
                    "Edit"
                }
                button hx-delete="/internal/members" hx-vals=(as_json) hx-target="#roster" class="bg-red-600 hover:bg-red-800 py-1 px-3 rounded" {
                    "Remove"
                }
            }
        },
    ]
}

pub async fn render_roster(state: &RosterState) -> Markup {
    let records = state.records().await;
    let last_error = state.last_error().await;

    html! {
        @if let Some(last_error) = last_error {
            div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4 flex flex-row justify-between" role="alert" {
                span {(last_error)}
                button hx-post="/internal/errors/dismiss" hx-target="#roster" class="font-bold px-2" {"×"}
            }
        }

        (render_table(
            ["StudentID", "NAME", "EMAIL", "ACTIONS"],
            records.iter().map(render_row).collect(),
            Some(html! {(EMPTY_ROSTER)}),
        ))
    }
}

pub async fn internal_get_roster(State(state): State<RosterState>) -> Markup {
    render_roster(&state).await
}

pub async fn internal_post_refresh(State(state): State<RosterState>) -> Markup {
    //a failure is already logged and shown in the error strip
    let _ = state
        .detached(|session| async move { session.refresh().await })
        .await;
    render_roster(&state).await
}

pub async fn internal_post_dismiss_error(State(state): State<RosterState>) -> Markup {
    state.dismiss_error().await;
    render_roster(&state).await
}
