pub(crate) async fn handler(
) -> Result<Box<dyn ::warp::Reply>, ::std::convert::Infallible> {
    Ok(Box::new(::warp::reply::json(&::serde_json::json!({
        "status": "ok",
    }))))
}
