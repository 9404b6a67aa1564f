use crate::{
    error::{ExpectedOneFileSnafu, MultipartSnafu, RosterResult},
    maud_conveniences::errors_list,
    remote::CsvUpload,
    routes::modal::render_modal,
    state::RosterState,
    view::ViewEvent,
};
use axum::extract::{Multipart, State};
use maud::{Markup, html};
use snafu::ResultExt;

async fn single_upload(mut multipart: Multipart) -> RosterResult<CsvUpload> {
    let mut uploads = vec![];
    loop {
        let Some(field) = multipart.next_field().await.context(MultipartSnafu)? else {
            break;
        };

        //an empty file input still sends a field, just without a file name
        let Some(file_name) = field.file_name().filter(|n| !n.is_empty()).map(ToString::to_string)
        else {
            continue;
        };

        let bytes = field.bytes().await.context(MultipartSnafu)?;
        uploads.push(CsvUpload { file_name, bytes });
    }

    snafu::ensure!(
        uploads.len() == 1,
        ExpectedOneFileSnafu {
            found: uploads.len()
        }
    );
    Ok(uploads.remove(0))
}

pub async fn internal_put_import(
    State(state): State<RosterState>,
    multipart: Multipart,
) -> RosterResult<Markup> {
    let upload = single_upload(multipart).await?;
    let view = state
        .apply_view_event(ViewEvent::FileChosen(upload.file_name.clone()))
        .await;

    let imported = state
        .detached(move |session| async move { session.import_csv(upload).await })
        .await;
    let notice = match imported {
        Ok(added) => html! { p class="italic mb-2" {"Successfully read " (added) " student(s)."} },
        Err(_) => errors_list(None, state.last_error().await.into_iter()),
    };

    Ok(render_modal(&view, state.progress().current(), Some(notice)))
}
