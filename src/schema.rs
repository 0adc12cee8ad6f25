// Practice companion schema - tables for the SQLite backend (Diesel ORM)

diesel::table! {
    practice_items (id) {
        id -> Text,
        title -> Text,
        kind -> Text,
        values_json -> Text,
        pinned -> Bool,
        allow_burst -> Bool,
        completed -> Bool,
    }
}

diesel::table! {
    practice_logs (id) {
        id -> Text,
        date_time -> Text,
        item_id -> Text,
        mode -> Text,
        minutes -> Integer,
        values_json -> Text,
        notes_awarded -> Integer,
    }
}

diesel::table! {
    practice_settings (key) {
        key -> Text,
        value -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(practice_items, practice_logs, practice_settings);
