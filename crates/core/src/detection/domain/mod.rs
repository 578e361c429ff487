pub mod detected_face;
pub mod detection_coordinator;
pub mod detection_options;
pub mod face_detector;
pub mod face_landmarks;
