use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub id: i64,
    pub quote_text: String,
    pub author: String,
    pub contributed_by: Option<String>,
    pub subjects: String,
    pub author_link: Option<String>,
    pub video_link: Option<String>,
    pub favorite: bool,
    pub deleted: bool,
}

/// A quote that has not been written yet; the store assigns its id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewQuote {
    pub quote_text: String,
    pub author: String,
    pub contributed_by: Option<String>,
    pub subjects: String,
    pub author_link: Option<String>,
    pub video_link: Option<String>,
    pub favorite: bool,
    pub deleted: bool,
}

impl From<Quote> for NewQuote {
    fn from(quote: Quote) -> Self {
        Self {
            quote_text: quote.quote_text,
            author: quote.author,
            contributed_by: quote.contributed_by,
            subjects: quote.subjects,
            author_link: quote.author_link,
            video_link: quote.video_link,
            favorite: quote.favorite,
            deleted: quote.deleted,
        }
    }
}

/// One record of the bundled dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetQuote {
    #[serde(rename = "_id")]
    pub id: i64,
    pub quote_text: String,
    pub author: String,
    #[serde(default)]
    pub contributed_by: Option<String>,
    #[serde(default)]
    pub subjects: String,
    #[serde(default)]
    pub author_link: Option<String>,
    #[serde(default)]
    pub video_link: Option<String>,
}

impl From<DatasetQuote> for NewQuote {
    fn from(record: DatasetQuote) -> Self {
        Self {
            quote_text: record.quote_text,
            author: record.author,
            contributed_by: record.contributed_by,
            subjects: record.subjects,
            author_link: record.author_link,
            video_link: record.video_link,
            favorite: false,
            deleted: false,
        }
    }
}
