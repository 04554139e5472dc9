use super::STATUS_OK;

pub async fn status() -> &'static str {
    STATUS_OK
}
