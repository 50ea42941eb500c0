use photosync_core::photo::{ListedPhoto, PhotoPage};

pub type PageHook = Box<dyn Fn(&PhotoPage)>;
pub type QueueHook = Box<dyn Fn()>;
pub type PhotoHook = Box<dyn Fn(&ListedPhoto)>;
pub type PhotoFinishedHook = Box<dyn Fn(&ListedPhoto, bool)>;

pub enum Hook {
    /// First listing page received, with its raw document
    QueueStarted(PageHook),
    /// All pages processed (or run cancelled), before any scrubbing
    QueueFinished(QueueHook),
    PhotoStarted(PhotoHook),
    /// Photo processed, with its success
    PhotoFinished(PhotoFinishedHook),
}

#[derive(Default)]
pub struct Hooks {
    queue_started: Vec<PageHook>,
    queue_finished: Vec<QueueHook>,
    photo_started: Vec<PhotoHook>,
    photo_finished: Vec<PhotoFinishedHook>,
}

impl Hooks {
    pub fn register(&mut self, hook: Hook) {
        match hook {
            Hook::QueueStarted(hook) => self.queue_started.push(hook),
            Hook::QueueFinished(hook) => self.queue_finished.push(hook),
            Hook::PhotoStarted(hook) => self.photo_started.push(hook),
            Hook::PhotoFinished(hook) => self.photo_finished.push(hook),
        }
    }

    pub fn queue_started(&self, page: &PhotoPage) {
        self.queue_started.iter().for_each(|hook| hook(page))
    }

    pub fn queue_finished(&self) {
        self.queue_finished.iter().for_each(|hook| hook())
    }

    pub fn photo_started(&self, photo: &ListedPhoto) {
        self.photo_started.iter().for_each(|hook| hook(photo))
    }

    pub fn photo_finished(&self, photo: &ListedPhoto, success: bool) {
        self.photo_finished
            .iter()
            .for_each(|hook| hook(photo, success))
    }
}
