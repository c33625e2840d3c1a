pub(crate) mod error_page;
