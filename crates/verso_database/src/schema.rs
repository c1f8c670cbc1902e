//! Diesel schema for the variant index.

diesel::table! {
    blobs (id) {
        id -> Uuid,
        storage_key -> Text,
        partition_name -> Text,
        media_type -> Text,
        byte_size -> Int8,
        checksum -> Text,
        metadata -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    variant_records (id) {
        id -> Uuid,
        source_id -> Uuid,
        descriptor_digest -> Text,
        artifact_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(variant_records -> blobs (artifact_id));

diesel::allow_tables_to_appear_in_same_query!(blobs, variant_records);
