use axum::{http::header::CONTENT_TYPE, response::IntoResponse};

pub(crate) async fn serve_main_css() -> impl IntoResponse {
    let css_content = include_str!("../../static/main.css");
    ([(CONTENT_TYPE, "text/css")], css_content)
}
