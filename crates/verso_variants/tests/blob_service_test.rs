//! Tests for source uploads and purges.

mod test_utils;

use test_utils::{Fixture, StubImageTransformer, png_bytes};
use uuid::Uuid;
use verso_core::{MediaType, Partition};
use verso_error::{DatabaseErrorKind, VersoErrorKind};
use verso_storage::ByteStore;
use verso_variants::TransformerRegistry;

fn fixture() -> Fixture {
    Fixture::new(TransformerRegistry::new().with(StubImageTransformer::new()))
}

#[tokio::test]
async fn test_upload_detects_media_type() {
    let fx = fixture();
    let local = Partition::new("local");

    // Content wins over a misleading filename.
    let sniffed = fx
        .blobs
        .upload(&local, &png_bytes("x"), Some("notes.txt"))
        .await
        .unwrap();
    assert_eq!(sniffed.media_type.as_str(), "image/png");

    let by_name = fx
        .blobs
        .upload(&local, b"no magic here", Some("song.mp3"))
        .await
        .unwrap();
    assert_eq!(by_name.media_type.as_str(), "audio/mpeg");

    let unknown = fx.blobs.upload(&local, b"???", None).await.unwrap();
    assert_eq!(unknown.media_type, MediaType::octet_stream());
}

#[tokio::test]
async fn test_upload_records_row_and_bytes() {
    let fx = fixture();
    let source = fx.image("local_public", "upload").await;

    let row = fx.blobs.find(source.id).await.unwrap().unwrap();
    assert_eq!(row, source);
    assert_eq!(row.metadata.filename.as_deref(), Some("photo.png"));
    assert_eq!(row.byte_size, png_bytes("upload").len() as i64);
    assert_eq!(
        fx.bytes.get(&source.partition, &source.key).await.unwrap(),
        png_bytes("upload")
    );
}

#[tokio::test]
async fn test_purge_removes_source_variants_and_bytes() {
    let fx = fixture();
    let source = fx.image("local", "purge").await;
    for size in ["10x10", "20x20"] {
        fx.engine
            .describe(&source, [("resize", size)].into_iter().collect())
            .unwrap()
            .process()
            .await
            .unwrap();
    }
    assert_eq!(fx.blobs.variants(source.id).await.unwrap().len(), 2);
    let local = Partition::new("local");
    assert_eq!(fx.bytes.object_count(&local).await, 3);

    let report = fx.blobs.purge(source.id).await.unwrap();

    assert_eq!(*report.variants_removed(), 2);
    assert_eq!(*report.objects_deleted(), 3);
    assert_eq!(fx.repository.record_count().await, 0);
    assert_eq!(fx.repository.blob_count().await, 0);
    assert_eq!(fx.bytes.object_count(&local).await, 0);
    assert!(fx.blobs.find(source.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_purge_reaches_variants_of_variants() {
    let fx = fixture();
    let source = fx.image("local", "nested").await;
    let thumb = fx
        .engine
        .describe(&source, [("resize", "50x50")].into_iter().collect())
        .unwrap()
        .process()
        .await
        .unwrap()
        .variant()
        .artifact
        .clone();
    fx.engine
        .describe(&thumb, [("resize", "10x10")].into_iter().collect())
        .unwrap()
        .process()
        .await
        .unwrap();
    let local = Partition::new("local");
    assert_eq!(fx.bytes.object_count(&local).await, 3);

    let report = fx.blobs.purge(source.id).await.unwrap();

    assert_eq!(*report.variants_removed(), 2);
    assert_eq!(*report.objects_deleted(), 3);
    assert_eq!(fx.repository.blob_count().await, 0);
    assert_eq!(fx.bytes.object_count(&local).await, 0);
}

#[tokio::test]
async fn test_purge_keeps_bytes_shared_with_other_sources() {
    let fx = fixture();
    let first = fx.image("local", "same").await;
    let second = fx.image("local", "same").await;
    assert_eq!(first.key, second.key);

    let report = fx.blobs.purge(first.id).await.unwrap();

    assert_eq!(*report.objects_deleted(), 0);
    assert!(fx.bytes.exists(&second.partition, &second.key).await.unwrap());
}

#[tokio::test]
async fn test_purge_of_unknown_source() {
    let fx = fixture();

    let err = fx.blobs.purge(Uuid::new_v4()).await.unwrap_err();

    match err.kind() {
        VersoErrorKind::Database(e) => assert_eq!(e.kind, DatabaseErrorKind::NotFound),
        other => panic!("expected database error, got {other}"),
    }
}
