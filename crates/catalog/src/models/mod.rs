mod book;
mod facet;

pub(crate) use self::book::{BookRow, date_to_column};
pub(crate) use self::facet::encode_names;
