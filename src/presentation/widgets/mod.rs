mod lazy_image_widget;

pub use lazy_image_widget::LazyImageWidget;
