pub mod db;
pub mod environment;
pub mod logging;
pub mod metadata;
pub mod review;
pub mod storage;

pub const TARGET_DB: &str = "db_query";
pub const TARGET_S3: &str = "s3_request";
pub const TARGET_METADATA: &str = "metadata";
