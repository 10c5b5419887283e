use std::collections::HashMap;
use std::sync::Arc;

use ragstore::core::{QueryOutput, RagError, VectorDb};
use ragstore::embeddings::FakeEmbeddings;
use ragstore::mongodb::{InMemoryDocumentStore, MongoDb, MongoDbConfig};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), RagError> {
    tracing_subscriber::fmt::init();

    // Use a live MongoDB when MONGODB_URI is set, an in-process store otherwise.
    let config = MongoDbConfig::from_env().with_collection_name("demo_docs");
    let mut db = if config.uri.is_some() {
        println!("=== Connecting to MongoDB ===");
        MongoDb::connect(config).await?
    } else {
        println!("=== Using in-memory document store (set MONGODB_URI for MongoDB) ===");
        MongoDb::with_store(config, Arc::new(InMemoryDocumentStore::new()))
    };
    db.set_embedder(Arc::new(FakeEmbeddings::new(32)));
    db.reset().await?;

    // --- Add ---
    println!("\n=== Adding Documents ===");
    let texts = [
        ("doc1", "rust", "Rust is a systems programming language focused on safety, speed, and concurrency."),
        ("doc2", "python", "Python is a high-level programming language known for its readability."),
        ("doc3", "rust", "Cargo is the Rust package manager and build tool."),
    ];
    let mut documents = Vec::new();
    let mut metadatas = Vec::new();
    let mut ids = Vec::new();
    for (id, topic, text) in texts {
        let mut metadata = HashMap::new();
        metadata.insert("topic".to_string(), json!(topic));
        metadata.insert("url".to_string(), json!(format!("https://example.com/{id}")));
        ids.push(id.to_string());
        documents.push(text.to_string());
        metadatas.push(metadata);
    }
    db.add(documents, metadatas, ids).await?;
    println!("Collection '{}' holds {} documents", db.collection_name(), db.count().await?);

    // --- Get ---
    println!("\n=== Get ===");
    let mut rust_only = HashMap::new();
    rust_only.insert("topic".to_string(), json!("rust"));
    let found = db.get(None, Some(&rust_only), None).await?;
    println!("Documents tagged 'rust': {:?}", found.ids);

    // --- Query ---
    println!("\n=== Query ===");
    match db.query("memory safety", 2, None, true).await? {
        QueryOutput::Cited(cited) => {
            for (text, metadata) in cited {
                println!("  [{}] {} ({})", metadata["score"], text, metadata["url"]);
            }
        }
        QueryOutput::Texts(texts) => {
            for text in texts {
                println!("  {text}");
            }
        }
    }

    // --- Delete ---
    println!("\n=== Delete ===");
    let mut python_only = HashMap::new();
    python_only.insert("topic".to_string(), json!("python"));
    db.delete(&python_only).await?;
    println!("After deleting 'python': {} documents", db.count().await?);

    // --- Reset ---
    db.reset().await?;
    tracing::info!(count = db.count().await?, "collection reset");
    println!("\nAfter reset: {} documents", db.count().await?);

    Ok(())
}
