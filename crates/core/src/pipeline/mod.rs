pub mod compare_faces_use_case;
pub mod comparison_error;
pub mod comparison_report;
pub mod detect_faces_use_case;
pub mod enroll_face_use_case;
pub mod forget_face_use_case;
pub mod identify_face_use_case;
pub mod pipeline_config;
pub mod pipeline_logger;
pub mod stages;
