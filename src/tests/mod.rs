mod common;
mod publish_pipeline;
