use std::path::Path;
use std::pin::Pin;

use super::super::types::PAGE_KEY;
use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};

/// Loads a PDF as one [`Document`] per page.
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let source = path.display().to_string();
            // pdf-extract may panic on malformed input; the blocking task turns that into a JoinError.
            let pages = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_by_pages(&path)
                    .map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await??;

            tracing::debug!(%source, pages = pages.len(), "extracted PDF text");

            Ok(pages
                .into_iter()
                .enumerate()
                .map(|(page, content)| {
                    let mut metadata = DocumentMetadata::new(source.clone(), "application/pdf");
                    metadata.extra.insert(PAGE_KEY.into(), page.to_string());
                    Document { content, metadata }
                })
                .collect())
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_nonexistent_file() {
        let result = PdfLoader::default()
            .load(Path::new("/nonexistent/file.pdf"))
            .await;
        assert!(matches!(result, Err(DocumentError::Io(_))));
    }

    #[tokio::test]
    async fn file_too_large_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.pdf");
        std::fs::write(&file, "%PDF-1.4").unwrap();

        let loader = PdfLoader { max_file_size: 0 };
        let result = loader.load(&file).await;
        assert!(matches!(result, Err(DocumentError::FileTooLarge(8))));
    }

    #[tokio::test]
    async fn non_pdf_content_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.pdf");
        std::fs::write(&file, "plain text pretending to be a PDF").unwrap();

        let result = PdfLoader::default().load(&file).await;
        assert!(result.is_err());
    }

    const TWO_PAGES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/two_pages.pdf");

    #[tokio::test]
    async fn two_page_pdf_yields_one_document_per_page() {
        let docs = PdfLoader::default().load(Path::new(TWO_PAGES)).await.unwrap();
        assert_eq!(docs.len(), 2);

        assert_eq!(docs[0].metadata.page(), Some(0));
        assert!(docs[0].content.contains("The capital of France is Paris."));
        assert_eq!(docs[1].metadata.page(), Some(1));
        assert!(docs[1].content.contains("Photosynthesis"));
        assert!(!docs[1].content.contains("Paris"));

        for doc in &docs {
            assert_eq!(doc.metadata.content_type, "application/pdf");
            assert!(doc.metadata.source.ends_with("two_pages.pdf"));
        }
    }

    #[test]
    fn supported_extensions_list() {
        assert_eq!(PdfLoader::default().supported_extensions(), &["pdf"]);
    }
}
