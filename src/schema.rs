/// diesel table for categories
table! {
    categories (id) {
        id -> Integer,
        name_en -> VarChar,
        name_ar -> VarChar,
        description_en -> Nullable<Text>,
        description_ar -> Nullable<Text>,
        slug -> VarChar,
        image -> Nullable<VarChar>,
        is_active -> Bool,
        sort_order -> Integer,
        created_at -> Timestamp, // UTC 0, generated at db level
        updated_at -> Timestamp, // UTC 0, generated at db level
    }
}

/// diesel table for products
table! {
    products (id) {
        id -> Integer,
        name_en -> VarChar,
        name_ar -> VarChar,
        description_en -> Nullable<Text>,
        description_ar -> Nullable<Text>,
        price -> VarChar,
        category_id -> Integer,
        image -> Nullable<VarChar>,
        stock -> Integer,
        is_active -> Bool,
        is_featured -> Bool,
        is_available -> Bool,
        sort_order -> Integer,
        created_at -> Timestamp, // UTC 0, generated at db level
        updated_at -> Timestamp, // UTC 0, generated at db level
    }
}

/// diesel table for orders
table! {
    orders (id) {
        id -> Integer,
        order_number -> VarChar,
        website_user_id -> Nullable<Integer>,
        customer_name -> VarChar,
        customer_phone -> VarChar,
        customer_email -> VarChar,
        delivery_address -> VarChar,
        delivery_city -> VarChar,
        delivery_area -> VarChar,
        total_amount -> VarChar,
        status -> VarChar,
        payment_method -> VarChar,
        payment_status -> VarChar,
        notes -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for order_items
table! {
    order_items (id) {
        id -> Integer,
        order_id -> Integer,
        product_id -> Integer,
        product_name -> VarChar,
        product_name_ar -> VarChar,
        product_price -> VarChar,
        quantity -> Integer,
        subtotal -> VarChar,
    }
}

/// diesel table for user_addresses
table! {
    user_addresses (id) {
        id -> Integer,
        user_id -> Integer,
        title -> Nullable<VarChar>,
        first_name -> VarChar,
        last_name -> VarChar,
        phone -> VarChar,
        address -> VarChar,
        city -> VarChar,
        area -> VarChar,
        is_default -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for website_users
table! {
    website_users (id) {
        id -> Integer,
        first_name -> VarChar,
        last_name -> VarChar,
        email -> VarChar,
        phone -> VarChar,
        password_hash -> VarChar,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for admin users
table! {
    users (id) {
        id -> Integer,
        username -> VarChar,
        email -> VarChar,
        password_hash -> VarChar,
        role -> VarChar,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

/// diesel table for sessions
table! {
    sessions (id) {
        id -> VarChar,
        kind -> VarChar,
        subject_id -> Integer,
        expires_at -> Timestamp,
        created_at -> Timestamp,
    }
}

/// diesel table for content_blocks
table! {
    content_blocks (section) {
        section -> VarChar,
        content -> Jsonb,
        updated_at -> Timestamp,
    }
}

joinable!(products -> categories (category_id));
joinable!(order_items -> orders (order_id));
joinable!(user_addresses -> website_users (user_id));

allow_tables_to_appear_in_same_query!(
    categories,
    products,
    orders,
    order_items,
    user_addresses,
    website_users,
    users,
    sessions,
    content_blocks
);
