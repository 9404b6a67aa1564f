use crate::{
    data::student::{StudentField, StudentRecord},
    maud_conveniences::errors_list,
    routes::{index::render_roster, modal::render_modal},
    state::RosterState,
    view::ViewEvent,
};
use axum::{
    Form,
    extract::{Query, State},
};
use maud::{Markup, html};
use serde::Deserialize;

///keeps whatever was typed so a failed submit doesn't lose it
async fn keep_draft(state: &RosterState, record: &StudentRecord) {
    for field in StudentField::ALL {
        state
            .apply_view_event(ViewEvent::EditField(field, record.get(field).to_string()))
            .await;
    }
}

fn missing_fields_notice(missing: &[StudentField]) -> Markup {
    errors_list(Some("Please fill in:"), missing.iter())
}

async fn failure_notice(state: &RosterState) -> Markup {
    errors_list(None, state.last_error().await.into_iter())
}

async fn modal_with(state: &RosterState, notice: Option<Markup>) -> Markup {
    render_modal(&state.view().await, state.progress().current(), notice)
}

pub async fn internal_put_new_member(
    State(state): State<RosterState>,
    Form(record): Form<StudentRecord>,
) -> Markup {
    keep_draft(&state, &record).await;

    let missing = record.missing_fields();
    if !missing.is_empty() {
        return modal_with(&state, Some(missing_fields_notice(&missing))).await;
    }

    let name = record.full_name();
    let added = state
        .detached(move |session| async move { session.add_member(record).await })
        .await;
    if added.is_err() {
        let notice = failure_notice(&state).await;
        return modal_with(&state, Some(notice)).await;
    }

    state.apply_view_event(ViewEvent::Saved).await;
    modal_with(&state, Some(html! { p class="italic mb-2" {"Added " (name)} })).await
}

#[derive(Deserialize)]
pub struct EditMemberForm {
    original_id: String,
    #[serde(flatten)]
    record: StudentRecord,
}

pub async fn internal_post_edit_member(
    State(state): State<RosterState>,
    Form(EditMemberForm {
        original_id,
        record,
    }): Form<EditMemberForm>,
) -> Markup {
    keep_draft(&state, &record).await;

    let missing = record.missing_fields();
    if !missing.is_empty() {
        return modal_with(&state, Some(missing_fields_notice(&missing))).await;
    }

    let updated = state
        .detached(move |session| async move { session.update_member(&original_id, record).await })
        .await;
    if updated.is_err() {
        let notice = failure_notice(&state).await;
        return modal_with(&state, Some(notice)).await;
    }

    state.apply_view_event(ViewEvent::Saved).await;
    modal_with(&state, None).await
}

pub async fn internal_delete_member(
    State(state): State<RosterState>,
    Query(record): Query<StudentRecord>,
) -> Markup {
    //shown in the roster's error strip if it fails
    let _ = state
        .detached(move |session| async move { session.remove_member(&record).await })
        .await;
    render_roster(&state).await
}
