use ragstore_core::RagError;
use ragstore_embeddings::{Embeddings, FakeEmbeddings};

#[tokio::test]
async fn fake_embeddings_returns_correct_dimensions() {
    let embeddings = FakeEmbeddings::new(8);
    let result = embeddings.embed_query("hello").await.unwrap();
    assert_eq!(result.len(), 8);
    assert_eq!(embeddings.dimensions(), 8);
}

#[tokio::test]
async fn fake_embeddings_deterministic() {
    let embeddings = FakeEmbeddings::default();
    let v1 = embeddings.embed_query("test").await.unwrap();
    let v2 = embeddings.embed_query("test").await.unwrap();
    assert_eq!(v1, v2);
}

#[tokio::test]
async fn fake_embeddings_batch_matches_query() {
    let embeddings = FakeEmbeddings::new(4);
    let results = embeddings
        .embed_documents(&["hello", "world"])
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], embeddings.embed_query("hello").await.unwrap());
    assert_eq!(results[1].len(), 4);
}

#[tokio::test]
async fn fake_embeddings_normalized() {
    let embeddings = FakeEmbeddings::new(4);
    let vec = embeddings.embed_query("hello world").await.unwrap();
    let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!(
        (magnitude - 1.0).abs() < 0.001,
        "vector should be unit length"
    );
}

#[tokio::test]
async fn fake_embeddings_empty_text_is_zero_vector() {
    let embeddings = FakeEmbeddings::new(3);
    let vec = embeddings.embed_query("").await.unwrap();
    assert_eq!(vec, vec![0.0, 0.0, 0.0]);
}

#[tokio::test]
async fn zero_dimensions_is_an_embedding_error() {
    let embeddings = FakeEmbeddings::new(0);
    let err = embeddings.embed_documents(&["x"]).await.unwrap_err();
    assert!(matches!(err, RagError::Embedding(_)));
}

#[tokio::test]
async fn fake_embeddings_ignore_case_and_punctuation() {
    let embeddings = FakeEmbeddings::new(16);
    let plain = embeddings.embed_query("hello world").await.unwrap();
    let noisy = embeddings.embed_query("Hello, WORLD!").await.unwrap();
    assert_eq!(plain, noisy);
}

#[tokio::test]
async fn fake_embeddings_punctuation_only_is_zero_vector() {
    let embeddings = FakeEmbeddings::new(2);
    let vec = embeddings.embed_query("?! ...").await.unwrap();
    assert_eq!(vec, vec![0.0, 0.0]);
}
