use crate::{
    config::LoaderConfig,
    dom::{is_valid_element_name, Document, Element},
    error::LoadError,
    net::{request, RequestError},
};
use http::StatusCode;
use std::{
    io,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Raw fragment text on success, the reason on failure.
pub type LoadResult = Result<String, LoadError>;

/// Invoked exactly once with the outcome of a [`FragmentLoader::load`].
pub type Callback = Box<dyn FnOnce(LoadResult) + Send + 'static>;

/// Fetches HTML fragments and appends them to a shared document body.
///
/// Cloning is cheap; clones share the same document and configuration.
#[derive(Clone, Debug)]
pub struct FragmentLoader {
    config: Arc<LoaderConfig>,
    document: Arc<Mutex<Document>>,
}

impl Default for FragmentLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl FragmentLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_document(config, Document::new())
    }

    pub fn with_document(config: LoaderConfig, document: Document) -> Self {
        FragmentLoader {
            config: Arc::new(config),
            document: Arc::new(Mutex::new(document)),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// A snapshot of the document as it is right now.
    pub fn document(&self) -> Document {
        self.lock_document().clone()
    }

    /// Looks up the first element whose class list contains `container_tag`.
    ///
    /// Best effort only: containers appended by [`load`](Self::load) carry no
    /// class, so this does not find them unless the fragment markup or the
    /// caller put a matching class on some element.
    pub fn get_container(&self, container_tag: &str) -> Option<Element> {
        if container_tag.is_empty() {
            return None;
        }
        self.lock_document()
            .query_selector(&format!(".{}", container_tag))
            .cloned()
    }

    /// Starts loading `location` in the background and returns immediately.
    ///
    /// On `200 OK` the body is wrapped in a new `container_tag` element and a
    /// clone of it is appended to the document body. Every other outcome is
    /// logged and leaves the document alone. Either way `callback`, if given,
    /// receives the result once. The handle only signals that the task ended.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load(
        &self,
        location: impl Into<String>,
        container_tag: impl Into<String>,
        callback: Option<Callback>,
    ) -> JoinHandle<()> {
        let loader = self.clone();
        let location = location.into();
        let container_tag = container_tag.into();
        tokio::spawn(async move {
            let result = loader.fetch_into(&location, &container_tag).await;
            if let Some(callback) = callback {
                callback(result);
            }
        })
    }

    /// Same as [`load`](Self::load), but hands the result back to the caller.
    pub async fn fetch_into(&self, location: &str, container_tag: &str) -> LoadResult {
        let result = self.fetch_and_append(location, container_tag).await;
        match &result {
            Ok(content) => debug!(location, container_tag, bytes = content.len(), "fragment appended"),
            Err(err) => error!(location, container_tag, error = %err, "fragment load failed"),
        }
        result
    }

    async fn fetch_and_append(&self, location: &str, container_tag: &str) -> LoadResult {
        if !is_valid_element_name(container_tag) {
            return Err(LoadError::InvalidContainerTag {
                tag: container_tag.to_string(),
            });
        }

        let config = Arc::clone(&self.config);
        let target = location.to_string();
        debug!(location, "fragment request sent");
        let response = tokio::task::spawn_blocking(move || request(&target, config.request_options()))
            .await
            .map_err(|e| RequestError::Io(io::Error::other(e.to_string())))??;

        if response.status != StatusCode::OK {
            return Err(LoadError::Status {
                status: response.status.as_u16(),
            });
        }
        let content = response.body_to_string().into_owned();

        let mut container = Element::new(container_tag).map_err(|_| LoadError::InvalidContainerTag {
            tag: container_tag.to_string(),
        })?;
        container.set_inner_html(&content);
        self.lock_document().append_to_body(container.clone());
        Ok(content)
    }

    fn lock_document(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
